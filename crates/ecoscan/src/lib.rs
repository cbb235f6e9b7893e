//! # EcoScan
//!
//! Screens environmental DNA samples for organisms that match none of the
//! known references in a batch.
//!
//! Each uploaded batch goes through five stages, all fitted on the batch
//! itself:
//!
//! 1. **Encode**: overlapping k-mers (k = 3) weighted by TF-IDF
//! 2. **Normalize**: per-column z-scores
//! 3. **Detect**: an isolation forest flags the ~10% easiest-to-isolate rows
//! 4. **Project**: PCA onto two axes for the result map
//! 5. **Assemble**: original fields plus `status`, `anomaly_confidence`,
//!    `pca_x`, `pca_y`
//!
//! ## Quick Start
//!
//! ```rust
//! use ecoscan::prelude::*;
//! use ecoscan::synthetic::{generate_records, SyntheticConfig};
//!
//! let records = generate_records(&SyntheticConfig::default().with_samples(60));
//! let rows = analyze(&records).unwrap();
//!
//! for row in rows.iter().filter(|r| r.status() == Status::NewOrganism) {
//!     println!("{:?} at ({}, {})", row.get("Location"), row.projection().x, row.projection().y);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`ecoscan_core`] - Records, verdicts, config, errors, CSV reading
//! - [`ecoscan_features`] - k-mer encoder and standard scaler
//! - [`ecoscan_engine`] - Isolation forest, PCA, pipeline
//! - [`synthetic`] - Seeded demo data generator
//!
//! The HTTP service lives in `ecoscan-web` and the command line tool in
//! `ecoscan-cli`.

pub mod synthetic;

pub use ecoscan_core as core;
pub use ecoscan_engine as engine;
pub use ecoscan_features as features;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ecoscan::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use ecoscan_core::types::{
        Projection, Record, ResultRow, Status, Verdict,
        sequence_of, round_to,
    };
    pub use ecoscan_core::config::{KmerWeighting, PipelineConfig};
    pub use ecoscan_core::table::{decode_text, read_records, write_records, write_table, TextEncoding};

    // Error types
    pub use ecoscan_core::error::{EcoScanError, Result, SchemaError};

    // Features
    pub use ecoscan_features::{FeatureMatrix, KmerVectorizer, StandardScaler, Vectorizer};

    // Engine
    pub use ecoscan_engine::{
        analyze, Analysis, AnalysisSummary,
        IsolationForest, ForestParams,
        Pca, Pipeline,
    };

    // Demo data
    pub use crate::synthetic::{generate, generate_records, SyntheticConfig, SyntheticSample};
}
