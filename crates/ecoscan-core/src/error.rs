//! Error types for EcoScan operations.
//!
//! A batch either fully succeeds or fully fails: every error here aborts the
//! whole pipeline run and no partial output is produced.

use thiserror::Error;

/// Result type for EcoScan operations.
pub type Result<T> = std::result::Result<T, EcoScanError>;

/// Errors that can occur while analyzing a batch.
#[derive(Debug, Error)]
pub enum EcoScanError {
    /// The batch does not have the shape the pipeline requires.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The batch has zero rows.
    #[error("Empty batch: at least one sample is required")]
    EmptyBatch,

    /// The batch is too small or too uniform for the projection to be defined.
    #[error("Degenerate batch: {features} distinct k-mer feature(s), at least 2 are required")]
    DegenerateBatch { features: usize },

    /// A matrix does not have the width a fitted model expects.
    #[error("Dimension mismatch: expected {expected} columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A pipeline parameter is out of range.
    #[error("Invalid config for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The uploaded table could not be parsed.
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EcoScanError {
    /// True when the caller supplied bad data, as opposed to an internal failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EcoScanError::Schema(_)
                | EcoScanError::EmptyBatch
                | EcoScanError::DegenerateBatch { .. }
                | EcoScanError::Csv(_)
        )
    }

    pub fn missing_column(column: impl Into<String>, row: usize) -> Self {
        EcoScanError::Schema(SchemaError::MissingColumn {
            column: column.into(),
            row,
        })
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EcoScanError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for EcoScanError {
    fn from(e: csv::Error) -> Self {
        EcoScanError::Csv(e.to_string())
    }
}

/// Schema violations in an input batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A required column is absent (or null) in the given row.
    #[error("missing required column `{column}` (row {row})")]
    MissingColumn { column: String, row: usize },

    /// A required column holds something other than text.
    #[error("column `{column}` must contain text (row {row})")]
    NotText { column: String, row: usize },
}

impl SchemaError {
    /// Name of the offending column.
    pub fn column(&self) -> &str {
        match self {
            SchemaError::MissingColumn { column, .. } | SchemaError::NotText { column, .. } => {
                column
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_the_column() {
        let err = EcoScanError::missing_column("Sequence", 3);
        assert_eq!(
            err.to_string(),
            "Schema error: missing required column `Sequence` (row 3)"
        );
        match err {
            EcoScanError::Schema(schema) => assert_eq!(schema.column(), "Sequence"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(EcoScanError::EmptyBatch.is_input_error());
        assert!(EcoScanError::DegenerateBatch { features: 1 }.is_input_error());
        assert!(EcoScanError::Csv("bad".into()).is_input_error());
        assert!(!EcoScanError::invalid_config("seed", "nope").is_input_error());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!EcoScanError::from(io).is_input_error());
    }
}
