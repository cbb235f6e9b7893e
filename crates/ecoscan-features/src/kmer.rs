//! k-mer feature encoder.
//!
//! Each sequence is cut into overlapping substrings of length `k`. By
//! default the vocabulary is every k-mer seen anywhere in the batch, sorted,
//! so two batches with different contents produce incomparable columns.
//! [`KmerVectorizer::with_vocabulary`] pins the columns instead.

use crate::normalize::normalize_l2;
use crate::vectorizer::{FeatureMatrix, Vectorizer};
use ecoscan_core::KmerWeighting;
use ndarray::{Array2, Axis};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// k-mer vectorizer with TF-IDF, count or frequency weighting.
///
/// # Example
///
/// ```rust
/// use ecoscan_features::{KmerVectorizer, Vectorizer};
///
/// let features = KmerVectorizer::new(3).fit_transform(&["ACGTA", "ACG"]);
/// assert_eq!(features.vocabulary, vec!["ACG", "CGT", "GTA"]);
/// ```
#[derive(Debug, Clone)]
pub struct KmerVectorizer {
    k: usize,
    weighting: KmerWeighting,
    vocabulary: Option<Vec<String>>,
}

impl KmerVectorizer {
    /// TF-IDF weighted k-mers of length `k`.
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            weighting: KmerWeighting::TfIdf,
            vocabulary: None,
        }
    }

    pub fn with_weighting(mut self, weighting: KmerWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Use a fixed vocabulary instead of learning one from each batch.
    ///
    /// k-mers outside the vocabulary are ignored. IDF weights are still
    /// computed from the batch being encoded.
    pub fn with_vocabulary(mut self, vocabulary: Vec<String>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn weighting(&self) -> KmerWeighting {
        self.weighting
    }

    /// Overlapping k-mers of one sequence, upper-cased, in order.
    ///
    /// Sequences shorter than `k` yield nothing.
    pub fn kmers(&self, sequence: &str) -> Vec<String> {
        let chars: Vec<char> = sequence.trim().to_uppercase().chars().collect();
        if chars.len() < self.k {
            return Vec::new();
        }
        chars.windows(self.k).map(|w| w.iter().collect()).collect()
    }

    fn learn_vocabulary(&self, tokenized: &[Vec<String>]) -> Vec<String> {
        match &self.vocabulary {
            Some(fixed) => fixed.clone(),
            None => tokenized
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<String>>()
                .into_iter()
                .collect(),
        }
    }
}

impl Default for KmerVectorizer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Vectorizer for KmerVectorizer {
    fn fit_transform(&self, sequences: &[&str]) -> FeatureMatrix {
        let tokenized: Vec<Vec<String>> = sequences.iter().map(|s| self.kmers(s)).collect();
        let vocabulary = self.learn_vocabulary(&tokenized);
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(j, kmer)| (kmer.as_str(), j))
            .collect();

        let mut matrix = Array2::<f64>::zeros((sequences.len(), vocabulary.len()));
        for (i, kmers) in tokenized.iter().enumerate() {
            for kmer in kmers {
                if let Some(&j) = index.get(kmer.as_str()) {
                    matrix[[i, j]] += 1.0;
                }
            }
        }

        match self.weighting {
            KmerWeighting::Counts => {}
            KmerWeighting::Frequency => {
                for mut row in matrix.rows_mut() {
                    let total = row.sum();
                    if total > 0.0 {
                        row.mapv_inplace(|v| v / total);
                    }
                }
            }
            KmerWeighting::TfIdf => {
                let n = sequences.len() as f64;
                let idf: Vec<f64> = matrix
                    .axis_iter(Axis(1))
                    .map(|column| {
                        let df = column.iter().filter(|v| **v > 0.0).count() as f64;
                        ((1.0 + n) / (1.0 + df)).ln() + 1.0
                    })
                    .collect();
                for mut row in matrix.rows_mut() {
                    for (v, w) in row.iter_mut().zip(&idf) {
                        *v *= w;
                    }
                    if let Some(values) = row.as_slice_mut() {
                        normalize_l2(values);
                    }
                }
            }
        }

        debug!(
            rows = sequences.len(),
            width = vocabulary.len(),
            k = self.k,
            "encoded k-mer features"
        );
        FeatureMatrix::new(vocabulary, matrix)
    }

    fn name(&self) -> &str {
        match self.weighting {
            KmerWeighting::Counts => "kmer-counts",
            KmerWeighting::Frequency => "kmer-frequency",
            KmerWeighting::TfIdf => "kmer-tfidf",
        }
    }
}

/// Every k-mer over `alphabet`, in lexicographic order of the alphabet.
///
/// Useful as a fixed vocabulary, e.g. `all_kmers("ACGT", 3)` gives all 64
/// DNA codons.
pub fn all_kmers(alphabet: &str, k: usize) -> Vec<String> {
    let symbols: Vec<char> = alphabet.chars().collect();
    let mut kmers = vec![String::new()];
    for _ in 0..k {
        kmers = kmers
            .iter()
            .flat_map(|prefix| {
                symbols.iter().map(move |c| {
                    let mut next = prefix.clone();
                    next.push(*c);
                    next
                })
            })
            .collect();
    }
    kmers
}
