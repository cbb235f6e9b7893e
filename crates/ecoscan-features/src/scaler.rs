//! Per-column standardization (zero mean, unit variance).

use ecoscan_core::{EcoScanError, Result};
use ndarray::{Array1, Array2, Axis};

/// Standard deviations at or below this, relative to the column mean, are
/// treated as zero.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Column-wise z-score scaler.
///
/// Uses the population standard deviation. A column that is constant across
/// the batch keeps a scale of 1, so it is centered but never divided by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn column means and standard deviations.
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows();
        if n == 0 {
            return Self {
                mean: Array1::zeros(x.ncols()),
                scale: Array1::ones(x.ncols()),
            };
        }

        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(column, &mu)| {
                let variance = column.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / n as f64;
                let std = variance.sqrt();
                if std <= ZERO_VARIANCE_TOLERANCE * mu.abs().max(1.0) {
                    1.0
                } else {
                    std
                }
            })
            .collect::<Array1<f64>>();

        Self { mean, scale }
    }

    /// Standardize a matrix with the fitted statistics.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(EcoScanError::DimensionMismatch {
                expected: self.mean.len(),
                got: x.ncols(),
            });
        }
        Ok(self.apply(x))
    }

    /// Fit on `x` and standardize it.
    pub fn fit_transform(x: &Array2<f64>) -> Array2<f64> {
        Self::fit(x).apply(x)
    }

    fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            row -= &self.mean;
            row /= &self.scale;
        }
        out
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_have_zero_mean_unit_variance() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let z = StandardScaler::fit_transform(&x);
        for column in z.axis_iter(Axis(1)) {
            let mean = column.sum() / 4.0;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_columns_do_not_divide_by_zero() {
        let x = array![[0.5, 1.0], [0.5, 2.0], [0.5, 3.0]];
        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.scale()[0], 1.0);

        let z = scaler.transform(&x).unwrap();
        assert!(z.iter().all(|v| v.is_finite()));
        assert!(z.column(0).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn identical_rows_stay_identical() {
        let row = [0.1, 0.7, 0.3];
        let x = Array2::from_shape_fn((10, 3), |(_, j)| row[j]);
        let z = StandardScaler::fit_transform(&x);
        for r in z.rows() {
            assert_eq!(r, z.row(0));
        }
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]);
        let err = scaler.transform(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(
            err,
            EcoScanError::DimensionMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn empty_matrix_is_tolerated() {
        let x = Array2::<f64>::zeros((0, 4));
        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.mean().len(), 4);
        assert_eq!(scaler.transform(&x).unwrap().dim(), (0, 4));
    }
}
