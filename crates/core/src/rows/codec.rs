//! Decoding of positional wire rows into named rows
//!
//! The service returns each row as `{"f": [{"v": ...}, ...]}` with cells in
//! schema order. Decoding pairs them with the schema field names and turns
//! `TIMESTAMP` cells (float seconds since the epoch) into instants.

use bqstream_domain::{BqError, Cell, FieldType, Result, Row, TableSchema, WireRow};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decode a page of wire rows against `schema`.
///
/// # Errors
/// Returns `BqError::MalformedResponse` when a row's arity differs from the
/// schema or a timestamp cell cannot be parsed.
pub fn decode_rows(schema: &TableSchema, rows: &[WireRow]) -> Result<Vec<Row>> {
    rows.iter().enumerate().map(|(position, row)| decode_row(schema, row, position)).collect()
}

fn decode_row(schema: &TableSchema, row: &WireRow, position: usize) -> Result<Row> {
    if row.f.len() != schema.fields.len() {
        return Err(BqError::MalformedResponse(format!(
            "row {position} has {} cells but the schema has {} fields",
            row.f.len(),
            schema.fields.len()
        )));
    }

    let mut decoded = Row::with_capacity(schema.fields.len());
    for (field, cell) in schema.fields.iter().zip(&row.f) {
        let value = match (&field.field_type, &cell.v) {
            (_, Value::Null) => Cell::Null,
            (FieldType::Timestamp, raw) => Cell::Timestamp(parse_timestamp(raw).ok_or_else(|| {
                BqError::MalformedResponse(format!(
                    "row {position} column {}: invalid TIMESTAMP {raw}",
                    field.name
                ))
            })?),
            (_, raw) => Cell::Value(raw.clone()),
        };
        decoded.push(field.name.clone(), value);
    }
    Ok(decoded)
}

/// Parse float seconds, given as a JSON string or number.
fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let seconds = match raw {
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

#[cfg(test)]
mod tests {
    use bqstream_domain::WireCell;
    use serde_json::json;

    use super::*;

    fn wire(cells: Vec<Value>) -> WireRow {
        WireRow { f: cells.into_iter().map(|v| WireCell { v }).collect() }
    }

    fn schema() -> TableSchema {
        TableSchema::from_fields([("name", "STRING"), ("ts", "TIMESTAMP"), ("count", "INTEGER")])
    }

    #[test]
    fn timestamp_seconds_become_instants() {
        let rows = decode_rows(&schema(), &[wire(vec![json!("a"), json!("1000000000"), json!("7")])])
            .unwrap();

        let ts = rows[0].get("ts").unwrap().as_timestamp().unwrap();
        assert_eq!(ts.timestamp(), 1_000_000_000);
        assert_eq!(ts.timestamp_subsec_micros(), 0);
    }

    #[test]
    fn fractional_and_exponent_forms_parse() {
        let rows = decode_rows(
            &schema(),
            &[
                wire(vec![json!("a"), json!("1.4143482E9"), json!("1")]),
                wire(vec![json!("b"), json!(1.5), json!("2")]),
            ],
        )
        .unwrap();

        assert_eq!(rows[0].get("ts").unwrap().as_timestamp().unwrap().timestamp(), 1_414_348_200);
        let half = rows[1].get("ts").unwrap().as_timestamp().unwrap();
        assert_eq!(half.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn non_timestamp_values_pass_through_and_nulls_stay_null() {
        let rows =
            decode_rows(&schema(), &[wire(vec![json!("alice"), Value::Null, json!("42")])]).unwrap();

        let row = &rows[0];
        assert_eq!(row.get("name").unwrap().as_str(), Some("alice"));
        assert!(row.get("ts").unwrap().is_null());
        assert_eq!(row.get("count"), Some(&Cell::Value(json!("42"))));
        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "ts", "count"]);
    }

    #[test]
    fn arity_mismatch_is_malformed() {
        let err = decode_rows(&schema(), &[wire(vec![json!("a")])]).unwrap_err();
        assert!(matches!(err, BqError::MalformedResponse(msg) if msg.contains("1 cells")));
    }

    #[test]
    fn garbage_timestamp_is_malformed() {
        let err =
            decode_rows(&schema(), &[wire(vec![json!("a"), json!("yesterday"), json!("1")])])
                .unwrap_err();
        assert!(matches!(err, BqError::MalformedResponse(msg) if msg.contains("ts")));
    }

    #[test]
    fn empty_page_decodes_to_nothing() {
        assert!(decode_rows(&schema(), &[]).unwrap().is_empty());
    }
}
