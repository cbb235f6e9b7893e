//! EcoScan Core Prelude - convenient imports for common usage.
//!
//! ```rust
//! use ecoscan_core::prelude::*;
//! ```

pub use crate::types::{
    round_to, sequence_of, Projection, Record, ResultRow, Status, Verdict, SEQUENCE_FIELD,
};

pub use crate::config::{KmerWeighting, PipelineConfig, ServerConfig, Settings};

pub use crate::table::{decode_text, read_records, write_records, write_table, TextEncoding};

pub use crate::error::{EcoScanError, Result, SchemaError};
