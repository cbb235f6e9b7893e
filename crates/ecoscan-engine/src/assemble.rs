//! Joins input records with their verdicts and map coordinates.

use ecoscan_core::{EcoScanError, Projection, Record, Result, ResultRow, Verdict};

/// Build one [`ResultRow`] per input record, in input order.
///
/// All three slices must have the same length.
pub fn assemble(
    records: &[Record],
    verdicts: &[Verdict],
    projections: &[Projection],
) -> Result<Vec<ResultRow>> {
    for got in [verdicts.len(), projections.len()] {
        if got != records.len() {
            return Err(EcoScanError::DimensionMismatch {
                expected: records.len(),
                got,
            });
        }
    }

    Ok(records
        .iter()
        .zip(verdicts)
        .zip(projections)
        .map(|((record, verdict), projection)| {
            ResultRow::new(record.clone(), *verdict, *projection)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoscan_core::Status;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            json!({"Sequence": "ATCG", "Location": "A"}),
            json!({"Sequence": "GGCC", "Location": "B"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    #[test]
    fn preserves_order_and_fields() {
        let verdicts = [
            Verdict::new(Status::KnownSpecies, 0.12),
            Verdict::new(Status::NewOrganism, -0.03),
        ];
        let points = [Projection::new(1.0, -1.0), Projection::new(0.0, 2.5)];
        let rows = assemble(&records(), &verdicts, &points).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Location"), Some(json!("B")));
        assert_eq!(rows[1].status(), Status::NewOrganism);
        assert_eq!(rows[1].projection(), Projection::new(0.0, 2.5));
        assert_eq!(rows[0].confidence(), 0.12);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let verdicts = [Verdict::new(Status::KnownSpecies, 0.0)];
        let points = [Projection::new(0.0, 0.0), Projection::new(0.0, 0.0)];
        assert!(matches!(
            assemble(&records(), &verdicts, &points),
            Err(EcoScanError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
