//! CSV tables in and out of the pipeline.
//!
//! Cells are typed the way a spreadsheet would read them: blanks become
//! `null`, numbers and booleans are recognized, everything else stays text.
//! The `Sequence` column is never re-typed.

use crate::error::Result;
use crate::types::{Record, ResultRow, SEQUENCE_FIELD};
use serde::Serialize;
use serde_json::{Number, Value};
use std::io::Write;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encoding an upload was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1 fallback; every byte maps to the code point of equal value.
    Latin1,
}

/// Decode raw bytes as UTF-8, falling back to Latin-1 when that fails.
///
/// A leading UTF-8 byte-order mark is dropped. The Latin-1 fallback never
/// fails and never loses bytes.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (
            bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Latin1,
        ),
    }
}

/// Parse CSV text with a header row into records.
pub fn read_records(text: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let value = if header == SEQUENCE_FIELD {
                sequence_cell(cell)
            } else {
                parse_cell(cell)
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }
    Ok(records)
}

/// Write analysis results as CSV.
pub fn write_records<W: Write>(rows: &[ResultRow], writer: W) -> Result<()> {
    let records: Vec<Record> = rows.iter().map(ResultRow::to_record).collect();
    write_table(&records, writer)
}

/// Write arbitrary records as CSV.
///
/// The header is the union of all field names in first-seen order; absent
/// fields are written as empty cells.
pub fn write_table<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&headers)?;
    for record in records {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| record.get(*h).map(cell_text).unwrap_or_default())
            .collect();
        out.write_record(&cells)?;
    }
    out.flush()?;
    Ok(())
}

fn sequence_cell(cell: &str) -> Value {
    if cell.trim().is_empty() {
        Value::Null
    } else {
        Value::String(cell.to_string())
    }
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(cell.to_string())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcoScanError;
    use crate::types::{Projection, Status, Verdict};
    use serde_json::json;

    #[test]
    fn typed_cells() {
        let text = "Sequence,Location,Latitude,Count,Flag,Note\n\
                    ATCGGC,Pacific Ocean Zone A,35.1234,7,true,\n";
        let records = read_records(text).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r["Sequence"], json!("ATCGGC"));
        assert_eq!(r["Location"], json!("Pacific Ocean Zone A"));
        assert_eq!(r["Latitude"], json!(35.1234));
        assert_eq!(r["Count"], json!(7));
        assert_eq!(r["Flag"], json!(true));
        assert_eq!(r["Note"], Value::Null);
    }

    #[test]
    fn sequence_column_stays_text() {
        let records = read_records("Sequence,Id\n1234,1\n,2\n").unwrap();
        assert_eq!(records[0]["Sequence"], json!("1234"));
        assert_eq!(records[1]["Sequence"], Value::Null);
    }

    #[test]
    fn column_order_is_preserved() {
        let records = read_records("Zeta,Sequence,Alpha\n1,ACG,2\n").unwrap();
        let keys: Vec<&str> = records[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Zeta", "Sequence", "Alpha"]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = read_records("Sequence,Location\nATCG\n").unwrap_err();
        assert!(matches!(err, EcoScanError::Csv(_)));
    }

    #[test]
    fn header_only_is_an_empty_table() {
        assert!(read_records("Sequence,Location\n").unwrap().is_empty());
    }

    #[test]
    fn utf8_and_bom() {
        let (text, enc) = decode_text("\u{feff}Sequence\nATCG\n".as_bytes());
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(text, "Sequence\nATCG\n");
    }

    #[test]
    fn latin1_fallback() {
        // "Zoné" in ISO-8859-1 is not valid UTF-8
        let bytes = [b'Z', b'o', b'n', 0xE9];
        let (text, enc) = decode_text(&bytes);
        assert_eq!(enc, TextEncoding::Latin1);
        assert_eq!(text, "Zoné");
    }

    #[test]
    fn results_written_with_computed_columns() {
        let source = json!({"Sequence": "ATCG", "Latitude": 35.5, "Note": null});
        let row = ResultRow::new(
            source.as_object().cloned().unwrap(),
            Verdict::new(Status::NewOrganism, -0.0731),
            Projection::new(2.0, -1.25),
        );

        let mut buf = Vec::new();
        write_records(&[row], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Sequence,Latitude,Note,status,anomaly_confidence,pca_x,pca_y"
        );
        assert_eq!(lines.next().unwrap(), "ATCG,35.5,,New Organism,-0.0731,2.0,-1.25");
    }

    #[test]
    fn table_header_is_union_of_fields() {
        let a = json!({"Sequence": "AAA", "Location": "X"});
        let b = json!({"Sequence": "CCC", "Depth": 12});
        let records = vec![
            a.as_object().cloned().unwrap(),
            b.as_object().cloned().unwrap(),
        ];
        let mut buf = Vec::new();
        write_table(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Sequence,Location,Depth\nAAA,X,\nCCC,,12\n");
    }
}
