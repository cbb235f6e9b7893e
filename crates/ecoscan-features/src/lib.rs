//! # EcoScan Features
//!
//! Turns variable-length DNA sequences into fixed-width numeric matrices:
//!
//! - [`KmerVectorizer`] - k-mer counts weighted by TF-IDF (or raw counts /
//!   relative frequency), with the vocabulary learned from the batch
//! - [`StandardScaler`] - per-column zero mean / unit variance
//! - Row utilities: [`l2_norm`], [`normalize_l2`]
//!
//! ## Usage
//!
//! ```rust
//! use ecoscan_features::{KmerVectorizer, StandardScaler, Vectorizer};
//!
//! let vectorizer = KmerVectorizer::new(3);
//! let features = vectorizer.fit_transform(&["ATCGAT", "ATCGGA"]);
//! assert_eq!(features.rows(), 2);
//!
//! let scaled = StandardScaler::fit(&features.matrix).transform(&features.matrix).unwrap();
//! assert_eq!(scaled.dim(), features.matrix.dim());
//! ```

mod kmer;
mod normalize;
mod scaler;
mod vectorizer;

pub use kmer::{all_kmers, KmerVectorizer};
pub use normalize::{l2_norm, normalize_l2};
pub use scaler::StandardScaler;
pub use vectorizer::{FeatureMatrix, Vectorizer};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FeatureMatrix, KmerVectorizer, StandardScaler, Vectorizer};
}
