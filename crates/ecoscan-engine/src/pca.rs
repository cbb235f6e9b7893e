//! Principal component projection for the result map.
//!
//! Only the leading directions are needed, so they are found by subspace
//! iteration against `Xᵀ X` (or `X Xᵀ` when the batch is wider than it is
//! long) without ever forming either matrix. Each step multiplies the
//! centered data by a block of at most `n_components + OVERSAMPLE` vectors,
//! so cost grows with `rows × width` rather than with the cube of either.

use ecoscan_core::{round_to, EcoScanError, Projection, Result};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Components kept for the 2-D map.
pub const MAP_COMPONENTS: usize = 2;

/// Decimal places kept in reported coordinates.
const COORDINATE_DECIMALS: i32 = 4;

/// Extra directions iterated alongside the requested ones.
const OVERSAMPLE: usize = 8;

const MAX_ITERATIONS: usize = 100;

/// Relative change in the leading Ritz values below which iteration stops.
const TOLERANCE: f64 = 1e-10;

/// Fixed seed for the starting block, so fits are reproducible.
const START_SEED: u64 = 0x0ec0_5ca9;

const MAX_SWEEPS: usize = 100;

/// A fitted principal component basis.
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// One unit-length component per row.
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    total_variance: f64,
}

impl Pca {
    /// Fit `n_components` directions of greatest variance.
    ///
    /// The sign of each component is fixed so that its largest-magnitude
    /// loading is positive, which makes repeated fits comparable.
    pub fn fit(x: &Array2<f64>, n_components: usize) -> Result<Self> {
        let (n, m) = x.dim();
        if n == 0 {
            return Err(EcoScanError::EmptyBatch);
        }
        if m < n_components {
            return Err(EcoScanError::DegenerateBatch { features: m });
        }

        let mean = x.mean_axis(Axis(0)).ok_or(EcoScanError::EmptyBatch)?;
        let centered = x - &mean;
        let dof = (n.max(2) - 1) as f64;
        let total_variance = centered.iter().map(|v| v * v).sum::<f64>() / dof;

        let mut components = Array2::<f64>::zeros((n_components, m));
        let mut explained_variance = Array1::<f64>::zeros(n_components);

        if m <= n {
            let pairs = leading_eigenpairs(
                |block| centered.t().dot(&centered.dot(block)),
                m,
                n_components,
            );
            for (k, (value, vector)) in pairs.into_iter().enumerate() {
                components.row_mut(k).assign(&vector);
                explained_variance[k] = value.max(0.0) / dof;
            }
        } else {
            // X = U S Vᵀ: X Xᵀ has eigenvectors U, and each loading vector
            // is Xᵀ u scaled to unit length.
            let pairs = leading_eigenpairs(
                |block| centered.dot(&centered.t().dot(block)),
                n,
                n_components,
            );
            for (k, (value, vector)) in pairs.into_iter().enumerate() {
                let loading = centered.t().dot(&vector);
                let norm = loading.dot(&loading).sqrt();
                if norm > f64::EPSILON {
                    components.row_mut(k).assign(&(loading / norm));
                    explained_variance[k] = value.max(0.0) / dof;
                }
            }
        }

        for mut component in components.rows_mut() {
            let pivot = component
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                component.mapv_inplace(|v| -v);
            }
        }

        debug!(
            rows = n,
            width = m,
            explained = ?explained_variance.to_vec(),
            "fitted principal components"
        );
        Ok(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    /// Coordinates of each row in component space.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(EcoScanError::DimensionMismatch {
                expected: self.mean.len(),
                got: x.ncols(),
            });
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }

    /// First two coordinates of each row, rounded for display.
    pub fn project(&self, x: &Array2<f64>) -> Result<Vec<Projection>> {
        let coordinates = self.transform(x)?;
        Ok(coordinates
            .rows()
            .into_iter()
            .map(|row| {
                let at = |k: usize| row.get(k).copied().unwrap_or(0.0);
                Projection::new(
                    round_to(at(0), COORDINATE_DECIMALS),
                    round_to(at(1), COORDINATE_DECIMALS),
                )
            })
            .collect())
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    /// Share of total variance carried by each component. Zero when the
    /// batch has no variance at all.
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        self.explained_variance
            .iter()
            .map(|v| {
                if self.total_variance > 0.0 {
                    v / self.total_variance
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Fit a two-component basis on `x` and project `x` onto it.
pub fn project_to_map(x: &Array2<f64>) -> Result<Vec<Projection>> {
    Pca::fit(x, MAP_COMPONENTS)?.project(x)
}

/// Indices of `values` from largest to smallest; ties keep index order.
fn descending(values: &Array1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

/// Up to `k` leading eigenpairs of a symmetric positive semi-definite
/// operator on `dim`-vectors, largest first.
///
/// `apply` maps a `dim × b` block to its image. When the block can cover
/// the whole space the result is exact after one step; otherwise a seeded
/// random block is iterated until the leading Ritz values settle. Fewer
/// than `k` pairs come back when the operator's range is smaller than `k`.
fn leading_eigenpairs<F>(apply: F, dim: usize, k: usize) -> Vec<(f64, Array1<f64>)>
where
    F: Fn(&Array2<f64>) -> Array2<f64>,
{
    let width = (k + OVERSAMPLE).min(dim);
    let exact = width == dim;
    let mut basis = if exact {
        Array2::eye(dim)
    } else {
        let mut rng = StdRng::seed_from_u64(START_SEED);
        orthonormalize(&Array2::from_shape_fn((dim, width), |_| {
            rng.gen_range(-1.0..1.0)
        }))
    };

    let mut previous: Vec<f64> = Vec::new();
    let mut iteration = 0;
    loop {
        iteration += 1;
        if basis.ncols() == 0 {
            return Vec::new();
        }

        // Rayleigh-Ritz on the current subspace
        let image = apply(&basis);
        let (values, vectors) = symmetric_eigen(basis.t().dot(&image));
        let order = descending(&values);
        let leading: Vec<f64> = order.iter().take(k).map(|&j| values[j]).collect();

        let scale = leading.first().copied().unwrap_or(0.0).abs().max(f64::MIN_POSITIVE);
        let settled = leading.len() == previous.len()
            && leading
                .iter()
                .zip(&previous)
                .all(|(a, b)| (a - b).abs() <= TOLERANCE * scale);

        if exact || settled || iteration >= MAX_ITERATIONS {
            debug!(iterations = iteration, dim, block = basis.ncols(), "eigen iteration done");
            return order
                .iter()
                .take(k)
                .map(|&j| (values[j], basis.dot(&vectors.column(j))))
                .collect();
        }

        previous = leading;
        basis = orthonormalize(&image);
    }
}

/// Modified Gram-Schmidt over the columns of `block`.
///
/// Columns that are numerically dependent on earlier ones are dropped, so
/// the result may be narrower than the input.
fn orthonormalize(block: &Array2<f64>) -> Array2<f64> {
    let largest = block
        .columns()
        .into_iter()
        .map(|c| c.dot(&c).sqrt())
        .fold(0.0_f64, f64::max);
    let floor = largest * 1e-10;

    let mut kept: Vec<Array1<f64>> = Vec::with_capacity(block.ncols());
    for column in block.columns() {
        let mut v = column.to_owned();
        for q in &kept {
            let projection = q.dot(&v);
            v.scaled_add(-projection, q);
        }
        let norm = v.dot(&v).sqrt();
        if norm > floor && norm > 0.0 {
            kept.push(v / norm);
        }
    }

    let mut out = Array2::<f64>::zeros((block.nrows(), kept.len()));
    for (j, q) in kept.iter().enumerate() {
        out.column_mut(j).assign(q);
    }
    out
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns eigenvalues and a matrix whose columns are the matching
/// orthonormal eigenvectors.
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale: f64 = a.iter().map(|x| x * x).sum();

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * scale || off == 0.0 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}
