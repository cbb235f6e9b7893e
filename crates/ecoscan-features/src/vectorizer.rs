//! Core vectorizer trait and the feature matrix it produces.

use ndarray::Array2;

/// A batch of sequences encoded as a dense matrix.
///
/// Row `i` belongs to input sequence `i`; column `j` to `vocabulary[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Feature names, one per column.
    pub vocabulary: Vec<String>,
    /// Row-per-sequence feature values.
    pub matrix: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(vocabulary: Vec<String>, matrix: Array2<f64>) -> Self {
        Self { vocabulary, matrix }
    }

    /// Number of encoded sequences.
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of features.
    pub fn width(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column index of a feature, if it is in the vocabulary.
    pub fn column_of(&self, feature: &str) -> Option<usize> {
        self.vocabulary.iter().position(|f| f == feature)
    }

    /// Indices of rows with no features at all (e.g. sequences shorter than k).
    pub fn empty_rows(&self) -> Vec<usize> {
        self.matrix
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| *v == 0.0))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Core trait for sequence encoders.
///
/// Implementors learn whatever they need from the batch itself, so the
/// width and meaning of the output columns are only valid within one call.
pub trait Vectorizer: Send + Sync {
    /// Fit on the batch and encode it in one step.
    fn fit_transform(&self, sequences: &[&str]) -> FeatureMatrix;

    /// Identifier for logs and summaries.
    fn name(&self) -> &str;
}
