//! Integration tests for wire payload shapes
//!
//! The service speaks camelCase JSON with most fields optional. These tests
//! pin the fields the client depends on.

use bqstream_domain::{
    Cell, FieldType, InsertAllRequest, InsertAllResponse, InsertRow, Job, JobState,
    QueryJobConfig, ResultPage, Row, Table, TableReference, TableSchema,
};
use serde_json::json;

// ============================================================================
// Streaming insert payloads
// ============================================================================

#[test]
fn test_insert_request_shape() {
    let rows = vec![
        InsertRow::with_insert_id("id-1", json!({"name": "a"})),
        InsertRow::with_insert_id("id-2", json!({"name": "b"})),
    ];

    let body = serde_json::to_value(InsertAllRequest::new(&rows)).unwrap();

    assert_eq!(
        body,
        json!({
            "kind": "bigquery#tableDataInsertAllRequest",
            "rows": [
                {"insertId": "id-1", "json": {"name": "a"}},
                {"insertId": "id-2", "json": {"name": "b"}}
            ]
        })
    );
}

#[test]
fn test_fresh_rows_get_distinct_insert_ids() {
    let a = InsertRow::new(json!({}));
    let b = InsertRow::new(json!({}));
    assert_ne!(a.insert_id, b.insert_id);
    assert!(!a.insert_id.is_empty());
}

#[test]
fn test_insert_response_with_and_without_errors() {
    let clean: InsertAllResponse =
        serde_json::from_value(json!({"kind": "bigquery#tableDataInsertAllResponse"})).unwrap();
    assert!(clean.insert_errors.is_empty());

    let partial: InsertAllResponse = serde_json::from_value(json!({
        "insertErrors": [
            {"index": 2, "errors": [{"reason": "invalid", "message": "bad value"}]},
            {"errors": [{"reason": "stopped"}]}
        ]
    }))
    .unwrap();
    assert_eq!(partial.insert_errors.len(), 2);
    assert_eq!(partial.insert_errors[0].index, Some(2));
    assert_eq!(partial.insert_errors[1].index, None);
    assert_eq!(partial.insert_errors[0].errors[0].reason.as_deref(), Some("invalid"));
}

// ============================================================================
// Job payloads
// ============================================================================

#[test]
fn test_job_submission_carries_destination_directive() {
    let job = Job::query(QueryJobConfig {
        query: Some("SELECT 1".into()),
        destination_table: Some(TableReference::new("p", "d", "daily")),
        ..Default::default()
    });

    let body = serde_json::to_value(&job).unwrap();
    assert_eq!(body["configuration"]["query"]["query"], "SELECT 1");
    assert_eq!(
        body["configuration"]["query"]["destinationTable"],
        json!({"projectId": "p", "datasetId": "d", "tableId": "daily"})
    );
    assert!(body.get("jobReference").is_none());
}

#[test]
fn test_job_status_parsing() {
    let job: Job = serde_json::from_value(json!({
        "jobReference": {"projectId": "p", "jobId": "job_123"},
        "status": {"state": "DONE"},
        "configuration": {"query": {
            "query": "SELECT 1",
            "destinationTable": {"projectId": "p", "datasetId": "_anon", "tableId": "anon_1"}
        }}
    }))
    .unwrap();

    assert_eq!(job.job_id(), Some("job_123"));
    assert!(job.is_done());
    assert!(job.error_result().is_none());
    assert_eq!(job.destination_table().map(|t| t.table_id.as_str()), Some("anon_1"));

    let running: Job = serde_json::from_value(json!({"status": {"state": "RUNNING"}})).unwrap();
    assert!(!running.is_done());
    assert_eq!(running.status.unwrap().state, JobState::Running);
}

#[test]
fn test_failed_job_exposes_error_result() {
    let job: Job = serde_json::from_value(json!({
        "status": {
            "state": "DONE",
            "errorResult": {"reason": "invalidQuery", "message": "Syntax error"}
        }
    }))
    .unwrap();

    assert_eq!(job.error_result().and_then(|e| e.reason.as_deref()), Some("invalidQuery"));
}

// ============================================================================
// Result pages and schemas
// ============================================================================

#[test]
fn test_result_page_optional_fields() {
    let empty: ResultPage = serde_json::from_value(json!({"totalRows": "0"})).unwrap();
    assert!(!empty.has_rows());
    assert_eq!(empty.total_rows(), Some(0));
    assert!(empty.page_token.is_none());

    let page: ResultPage = serde_json::from_value(json!({
        "rows": [{"f": [{"v": "1"}, {"v": null}]}],
        "pageToken": "tok",
        "totalRows": "42"
    }))
    .unwrap();
    assert!(page.has_rows());
    assert_eq!(page.page_token.as_deref(), Some("tok"));
    assert_eq!(page.total_rows(), Some(42));
}

#[test]
fn test_schema_from_mapping_keeps_order_and_types() {
    let schema = TableSchema::from_fields([
        ("ts", FieldType::Timestamp),
        ("name", FieldType::String),
        ("count", FieldType::from("INT64")),
    ]);

    let table = Table::new(TableReference::new("p", "d", "t"), schema);
    let body = serde_json::to_value(&table).unwrap();

    assert_eq!(
        body["schema"]["fields"],
        json!([
            {"name": "ts", "type": "TIMESTAMP"},
            {"name": "name", "type": "STRING"},
            {"name": "count", "type": "INTEGER"}
        ])
    );
}

#[test]
fn test_unknown_field_type_round_trips_name() {
    let ty: FieldType = serde_json::from_value(json!("GEOGRAPHY")).unwrap();
    assert_eq!(ty, FieldType::Other("GEOGRAPHY".into()));
    assert_eq!(serde_json::to_value(&ty).unwrap(), json!("GEOGRAPHY"));
}

#[test]
fn test_decoded_row_serializes_as_object() {
    let mut row = Row::with_capacity(2);
    row.push("name", Cell::Value(json!("a")));
    row.push("missing", Cell::Null);

    assert_eq!(serde_json::to_value(&row).unwrap(), json!({"name": "a", "missing": null}));
    assert_eq!(row.get("name").and_then(Cell::as_str), Some("a"));
    assert!(row.get("missing").is_some_and(Cell::is_null));
}
