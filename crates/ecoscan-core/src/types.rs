//! Shared types used across the EcoScan crates.

use crate::error::{EcoScanError, Result, SchemaError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// One row of an input table: field name → value, in column order.
///
/// Fields other than [`SEQUENCE_FIELD`] are opaque to the pipeline and are
/// passed through to the output untouched.
pub type Record = serde_json::Map<String, Value>;

/// The required input column holding the DNA sequence.
pub const SEQUENCE_FIELD: &str = "Sequence";
/// Output column carrying the [`Status`] label.
pub const STATUS_FIELD: &str = "status";
/// Output column carrying the anomaly decision score.
pub const CONFIDENCE_FIELD: &str = "anomaly_confidence";
/// Output column carrying the first principal coordinate.
pub const PCA_X_FIELD: &str = "pca_x";
/// Output column carrying the second principal coordinate.
pub const PCA_Y_FIELD: &str = "pca_y";

const OUTPUT_FIELDS: [&str; 4] = [STATUS_FIELD, CONFIDENCE_FIELD, PCA_X_FIELD, PCA_Y_FIELD];

/// Extract the sequence text of a record.
///
/// A missing or `null` sequence is a [`SchemaError::MissingColumn`]; any
/// other non-string value is a [`SchemaError::NotText`].
pub fn sequence_of(record: &Record, row: usize) -> Result<&str> {
    match record.get(SEQUENCE_FIELD) {
        Some(Value::String(s)) => Ok(s.as_str()),
        None | Some(Value::Null) => Err(EcoScanError::missing_column(SEQUENCE_FIELD, row)),
        Some(_) => Err(SchemaError::NotText {
            column: SEQUENCE_FIELD.to_string(),
            row,
        }
        .into()),
    }
}

/// Round to a fixed number of decimal digits, folding `-0.0` into `0.0`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Classification of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Fits the bulk of the batch.
    #[serde(rename = "Known Species")]
    KnownSpecies,
    /// Isolated unusually quickly: a candidate new organism.
    #[serde(rename = "New Organism")]
    NewOrganism,
}

impl Status {
    /// Human-readable label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Status::KnownSpecies => "Known Species",
            Status::NewOrganism => "New Organism",
        }
    }

    pub fn is_anomaly(&self) -> bool {
        matches!(self, Status::NewOrganism)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anomaly verdict for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    /// Decision score; negative means anomalous, more negative is stronger.
    pub confidence: f64,
}

impl Verdict {
    pub fn new(status: Status, confidence: f64) -> Self {
        Self { status, confidence }
    }
}

/// A sample's coordinate in the 2-D principal component plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub x: f64,
    pub y: f64,
}

impl Projection {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One output row: the original record plus the computed columns.
///
/// Serializes as a single flat object: the original fields in their
/// original order, followed by `status`, `anomaly_confidence`, `pca_x` and
/// `pca_y`. Input fields that share one of those names are replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    source: Record,
    verdict: Verdict,
    projection: Projection,
}

impl ResultRow {
    pub fn new(source: Record, verdict: Verdict, projection: Projection) -> Self {
        Self {
            source,
            verdict,
            projection,
        }
    }

    /// The original input fields.
    pub fn source(&self) -> &Record {
        &self.source
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn status(&self) -> Status {
        self.verdict.status
    }

    pub fn confidence(&self) -> f64 {
        self.verdict.confidence
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Look up an output field by name, computed columns included.
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            STATUS_FIELD => Some(Value::from(self.verdict.status.label())),
            CONFIDENCE_FIELD => Some(Value::from(self.verdict.confidence)),
            PCA_X_FIELD => Some(Value::from(self.projection.x)),
            PCA_Y_FIELD => Some(Value::from(self.projection.y)),
            _ => self.source.get(field).cloned(),
        }
    }

    /// Flatten into a new record.
    pub fn to_record(&self) -> Record {
        let mut out: Record = self
            .source
            .iter()
            .filter(|(k, _)| !OUTPUT_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for field in OUTPUT_FIELDS {
            if let Some(value) = self.get(field) {
                out.insert(field.to_string(), value);
            }
        }
        out
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let passthrough = self
            .source
            .iter()
            .filter(|(k, _)| !OUTPUT_FIELDS.contains(&k.as_str()));
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in passthrough {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry(STATUS_FIELD, &self.verdict.status)?;
        map.serialize_entry(CONFIDENCE_FIELD, &self.verdict.confidence)?;
        map.serialize_entry(PCA_X_FIELD, &self.projection.x)?;
        map.serialize_entry(PCA_Y_FIELD, &self.projection.y)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn sequence_lookup() {
        let ok = record(json!({"Sequence": "ATCG", "Location": "Zone A"}));
        assert_eq!(sequence_of(&ok, 0).unwrap(), "ATCG");

        let missing = record(json!({"Location": "Zone A"}));
        assert!(matches!(
            sequence_of(&missing, 4),
            Err(EcoScanError::Schema(SchemaError::MissingColumn { row: 4, .. }))
        ));

        let null = record(json!({"Sequence": null}));
        assert!(matches!(
            sequence_of(&null, 0),
            Err(EcoScanError::Schema(SchemaError::MissingColumn { .. }))
        ));

        let number = record(json!({"Sequence": 42}));
        assert!(matches!(
            sequence_of(&number, 1),
            Err(EcoScanError::Schema(SchemaError::NotText { row: 1, .. }))
        ));
    }

    #[test]
    fn rounding_to_four_places() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-1.00004, 4), -1.0);
        assert!(round_to(-0.00001, 4).is_sign_positive());
        assert!(round_to(f64::NAN, 4).is_nan());
    }

    #[test]
    fn status_serializes_to_display_label() {
        assert_eq!(
            serde_json::to_value(Status::NewOrganism).unwrap(),
            json!("New Organism")
        );
        assert_eq!(Status::KnownSpecies.to_string(), "Known Species");
        assert!(Status::NewOrganism.is_anomaly());
        assert!(!Status::KnownSpecies.is_anomaly());
    }

    #[test]
    fn result_row_flattens_in_order() {
        let source = record(json!({"Sequence": "ATCG", "Latitude": 35.1, "status": "stale"}));
        let row = ResultRow::new(
            source,
            Verdict::new(Status::KnownSpecies, 0.0412),
            Projection::new(1.5, -0.25),
        );

        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["Sequence", "Latitude", "status", "anomaly_confidence", "pca_x", "pca_y"]
        );
        assert_eq!(value["status"], json!("Known Species"));
        assert_eq!(value["pca_y"], json!(-0.25));
        assert_eq!(Value::Object(row.to_record()), value);

        // the source record is left as supplied
        assert_eq!(row.source()["status"], json!("stale"));
    }
}
