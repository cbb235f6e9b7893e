//! # EcoScan Engine
//!
//! Model stages of the screening pipeline and the [`Pipeline`] that chains
//! them:
//!
//! - [`IsolationForest`]: flags samples that are easy to isolate
//! - [`Pca`]: two-component projection for the result map
//! - [`assemble`]: joins records with verdicts and coordinates
//!
//! ## Usage
//!
//! ```rust
//! use ecoscan_core::read_records;
//! use ecoscan_engine::analyze;
//!
//! let csv = "Sequence,Location\n\
//!            ATCGGCTACGATCG,Zone A\n\
//!            ATCGGCTACGATCC,Zone A\n\
//!            TTTTAAAACCCCGG,Zone X\n";
//! let records = read_records(csv).unwrap();
//! let rows = analyze(&records).unwrap();
//! assert_eq!(rows.len(), 3);
//! ```

pub mod assemble;
pub mod isolation;
pub mod pca;
pub mod pipeline;

pub use assemble::assemble;
pub use isolation::{average_path_length, ForestParams, IsolationForest};
pub use pca::{project_to_map, Pca, MAP_COMPONENTS};
pub use pipeline::{analyze, Analysis, AnalysisSummary, Pipeline};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{analyze, Analysis, AnalysisSummary, IsolationForest, Pca, Pipeline};
}
