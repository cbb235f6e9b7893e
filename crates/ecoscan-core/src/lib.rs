//! # EcoScan Core
//!
//! Shared types for the EcoScan eDNA screening pipeline:
//!
//! - [`Record`] - one input row, an ordered field-name → value map
//! - [`Status`] / [`Verdict`] - per-sample anomaly classification
//! - [`Projection`] - per-sample 2-D coordinate
//! - [`ResultRow`] - an input row extended with verdict and projection
//! - [`PipelineConfig`] - tunables for the analysis pipeline
//! - [`Settings`] - contents of an `ecoscan.toml` file (`[pipeline]` and `[server]`)
//! - [`EcoScanError`] - typed failures (schema, empty batch, degenerate batch)
//!
//! The [`table`] module reads and writes CSV batches and decodes uploaded
//! bytes with a Latin-1 fallback for non-UTF-8 input.
//!
//! ## Quick Start
//!
//! ```rust
//! use ecoscan_core::prelude::*;
//!
//! let records = read_records("Sequence,Location\nATCGGC,Zone A\n").unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(sequence_of(&records[0], 0).unwrap(), "ATCGGC");
//! ```
//!
//! The table helpers are also re-exported at the crate root:
//!
//! ```rust
//! use ecoscan_core::{read_records, write_table};
//!
//! let records = read_records("Sequence\nACGT\n").unwrap();
//! let mut out = Vec::new();
//! write_table(&records, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "Sequence\nACGT\n");
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod table;
pub mod types;

pub use config::{KmerWeighting, PipelineConfig, ServerConfig, Settings, CONFIG_FILE_NAME};
pub use error::{EcoScanError, Result, SchemaError};
pub use table::{decode_text, read_records, write_records, write_table, TextEncoding};
pub use types::{
    round_to, sequence_of, Projection, Record, ResultRow, Status, Verdict, CONFIDENCE_FIELD,
    PCA_X_FIELD, PCA_Y_FIELD, SEQUENCE_FIELD, STATUS_FIELD,
};
