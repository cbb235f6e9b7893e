//! Isolation forest: anomaly detection by random partitioning.
//!
//! Each tree repeatedly picks a random feature and a random cut point until
//! every sample sits alone (or the height limit is hit). Samples that are
//! unlike the rest get separated after only a few cuts, so a short average
//! path over the ensemble marks an outlier.
//!
//! Scores follow Liu, Ting & Zhou (2008): `s(x) = 2^(-E[h(x)] / c(ψ))` with
//! `ψ` the subsample size. The decision threshold is the `contamination`
//! quantile of the training scores.

use ecoscan_core::{round_to, PipelineConfig, Status, Verdict};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Decimal places kept in reported confidences.
const CONFIDENCE_DECIMALS: i32 = 4;

/// Average path length of an unsuccessful BST search over `n` points.
///
/// Normalizes tree depths; also credits a leaf that still holds `n` points
/// with the depth it would have needed to isolate them.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Ensemble parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ForestParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One randomized partitioning tree, stored as a flat node arena.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(x: &Array2<f64>, rows: &[usize], height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(x, rows, 0, height_limit, rng);
        tree
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        rows: &[usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return index;
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|feature| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = x[[r, feature]];
                    (lo.min(v), hi.max(v))
                });
                (hi > lo).then_some((feature, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return index;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| x[[r, feature]] <= threshold);

        let left = self.build(x, &left_rows, depth + 1, height_limit, rng);
        let right = self.build(x, &right_rows, depth + 1, height_limit, rng);
        self.nodes[index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        index
    }

    fn path_length(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], node: usize) -> usize {
            match &nodes[node] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// A fitted isolation forest.
///
/// Fitting is deterministic for a given seed: each tree gets its own seed
/// drawn in order from a master generator, so the thread pool layout has no
/// effect on the result.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
    width: usize,
    offset: f64,
}

impl IsolationForest {
    /// Grow the ensemble on `x` and calibrate the decision threshold.
    pub fn fit(x: &Array2<f64>, params: &ForestParams) -> Self {
        let n = x.nrows();
        let subsample_size = params.max_samples.min(n).max(1);
        let height_limit = (subsample_size.max(2) as f64).log2().ceil() as usize;

        let mut master = StdRng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.n_trees).map(|_| master.gen()).collect();

        let trees: Vec<IsolationTree> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let rows = if n == 0 {
                    Vec::new()
                } else {
                    rand::seq::index::sample(&mut rng, n, subsample_size).into_vec()
                };
                IsolationTree::grow(x, &rows, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            subsample_size,
            width: x.ncols(),
            offset: 0.0,
        };
        let training_scores = forest.score_samples(x);
        forest.offset = percentile(&training_scores, params.contamination);

        debug!(
            trees = forest.trees.len(),
            subsample_size,
            height_limit,
            offset = forest.offset,
            "fitted isolation forest"
        );
        forest
    }

    /// Opposite of the anomaly score: lower means more abnormal.
    ///
    /// Values lie in `[-1, 0)`; an average point scores about `-0.5`.
    pub fn score_samples(&self, x: &Array2<f64>) -> Vec<f64> {
        let normalizer = match average_path_length(self.subsample_size) {
            c if c > 0.0 => c,
            _ => 1.0,
        };
        (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                let total: f64 = self.trees.iter().map(|tree| tree.path_length(row)).sum();
                let mean_depth = if self.trees.is_empty() {
                    0.0
                } else {
                    total / self.trees.len() as f64
                };
                -(2f64.powf(-mean_depth / normalizer))
            })
            .collect()
    }

    /// Score shifted by the fitted threshold; negative means anomalous.
    pub fn decision_function(&self, x: &Array2<f64>) -> Vec<f64> {
        self.score_samples(x)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// Label every row and attach its rounded decision score.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<Verdict> {
        self.decision_function(x)
            .into_iter()
            .map(|decision| {
                let status = if decision < 0.0 {
                    Status::NewOrganism
                } else {
                    Status::KnownSpecies
                };
                Verdict::new(status, round_to(decision, CONFIDENCE_DECIMALS))
            })
            .collect()
    }

    /// Threshold subtracted from raw scores by [`decision_function`](Self::decision_function).
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    /// Number of features the forest was grown on.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Deepest split chain across the ensemble.
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(IsolationTree::depth).max().unwrap_or(0)
    }
}

/// Linearly interpolated quantile `q` in `[0, 1]` of `values`.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    let fraction = position - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(n_trees: usize) -> ForestParams {
        ForestParams {
            n_trees,
            ..ForestParams::default()
        }
    }

    /// A tight 2-D cluster plus one far point at the end.
    fn cluster_with_outlier() -> Array2<f64> {
        let mut rows = Vec::new();
        for i in 0..19 {
            let t = i as f64 * 0.1;
            rows.push([t.sin() * 0.2, t.cos() * 0.2]);
        }
        rows.push([8.0, -8.0]);
        Array2::from_shape_fn((rows.len(), 2), |(i, j)| rows[i][j])
    }

    #[test]
    fn average_path_length_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) ≈ 10.24
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 4.0);
        assert!((percentile(&values, 0.5) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&[7.0; 5], 0.1), 7.0);
    }

    #[test]
    fn outlier_gets_lowest_score() {
        let x = cluster_with_outlier();
        let forest = IsolationForest::fit(&x, &params(100));
        let scores = forest.score_samples(&x);

        let lowest = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(lowest, 19);
        assert!(scores.iter().all(|s| (-1.0..0.0).contains(s)));
    }

    #[test]
    fn contamination_sets_flag_rate() {
        let x = cluster_with_outlier();
        let forest = IsolationForest::fit(&x, &params(200));
        let verdicts = forest.predict(&x);
        let flagged: Vec<usize> = verdicts
            .iter()
            .enumerate()
            .filter(|(_, v)| v.status.is_anomaly())
            .map(|(i, _)| i)
            .collect();
        // 10% of 20 rows sits between the two lowest scores
        assert!(flagged.contains(&19));
        assert!(flagged.len() <= 2);
        for v in verdicts.iter().filter(|v| !v.status.is_anomaly()) {
            assert!(v.confidence >= 0.0);
        }
    }

    #[test]
    fn same_seed_same_scores() {
        let x = cluster_with_outlier();
        let a = IsolationForest::fit(&x, &params(50)).score_samples(&x);
        let b = IsolationForest::fit(&x, &params(50)).score_samples(&x);
        assert_eq!(a, b);

        let other = ForestParams {
            seed: 7,
            ..params(50)
        };
        let c = IsolationForest::fit(&x, &other).score_samples(&x);
        assert_ne!(a, c);
    }

    #[test]
    fn constant_data_flags_nothing() {
        let x = Array2::from_elem((12, 3), 0.25);
        let forest = IsolationForest::fit(&x, &params(50));
        assert_eq!(forest.max_depth(), 0);

        let verdicts = forest.predict(&x);
        assert!(verdicts.iter().all(|v| v.status == Status::KnownSpecies));
        assert!(verdicts.iter().all(|v| v.confidence == 0.0));
    }

    #[test]
    fn tiny_batches_do_not_panic() {
        let one = array![[1.0, 2.0]];
        let verdicts = IsolationForest::fit(&one, &params(10)).predict(&one);
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].confidence.is_finite());

        let two = array![[0.0, 0.0], [1.0, 1.0]];
        let verdicts = IsolationForest::fit(&two, &params(10)).predict(&two);
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts.iter().all(|v| v.confidence.is_finite()));
    }

    #[test]
    fn subsample_and_height_are_bounded() {
        let x = Array2::from_shape_fn((600, 2), |(i, j)| ((i * 31 + j * 17) % 97) as f64);
        let forest = IsolationForest::fit(
            &x,
            &ForestParams {
                max_samples: 64,
                ..params(20)
            },
        );
        assert_eq!(forest.subsample_size(), 64);
        assert_eq!(forest.n_trees(), 20);
        assert_eq!(forest.width(), 2);
        assert!(forest.max_depth() <= 6);
    }
}
