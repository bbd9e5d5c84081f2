//! Streaming inserts with targeted resubmission
//!
//! A partially failed `insertAll` reports the rejected rows by index. Only
//! those rows are sent again, with the insert ids they were first sent with,
//! so the service can deduplicate.

use std::collections::BTreeSet;

use bqstream_domain::{
    BqError, InsertAllRequest, InsertAllResponse, InsertConfig, InsertError, InsertRow, Result,
    TableReference,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::endpoints::Endpoints;
use crate::request::RequestGate;

/// Streaming inserts into any table of the project
pub struct RowInserter {
    gate: RequestGate,
    endpoints: Endpoints,
    config: InsertConfig,
}

impl RowInserter {
    /// Create an inserter sending through `gate`.
    pub fn new(gate: RequestGate, endpoints: Endpoints, config: InsertConfig) -> Self {
        Self { gate, endpoints, config }
    }

    /// Insert plain JSON records, assigning each a fresh insert id.
    pub async fn insert_json(&self, table: &TableReference, records: Vec<Value>) -> Result<bool> {
        self.insert(table, records.into_iter().map(InsertRow::new).collect()).await
    }

    /// Insert rows in chunks of `max_batch_size`.
    ///
    /// Returns `true` when every row was eventually accepted and `false`
    /// when some chunk still had rejected rows after `max_resubmits` rounds.
    ///
    /// # Errors
    /// Transport and service errors are terminal for the call.
    #[instrument(skip(self, rows), fields(table = %table, rows = rows.len()))]
    pub async fn insert(&self, table: &TableReference, rows: Vec<InsertRow>) -> Result<bool> {
        if rows.is_empty() {
            return Ok(true);
        }

        let url = self.endpoints.insert_all(table);
        let batch_size = self.config.max_batch_size.max(1);
        let mut accepted = true;
        let mut rows = rows.into_iter().peekable();

        while rows.peek().is_some() {
            let batch: Vec<InsertRow> = rows.by_ref().take(batch_size).collect();
            accepted &= self.insert_batch(&url, batch).await?;
        }

        if accepted {
            info!("insert accepted");
        }
        Ok(accepted)
    }

    async fn insert_batch(&self, url: &str, mut pending: Vec<InsertRow>) -> Result<bool> {
        for round in 0..=self.config.max_resubmits {
            let response: InsertAllResponse =
                self.gate.post_json(url, &InsertAllRequest::new(&pending)).await?;

            if response.insert_errors.is_empty() {
                return Ok(true);
            }

            pending = select_rejected(pending, &response.insert_errors)?;
            warn!(round, rejected = pending.len(), "rows rejected; resubmitting");
        }

        warn!(
            rejected = pending.len(),
            max_resubmits = self.config.max_resubmits,
            "giving up on rejected rows"
        );
        Ok(false)
    }
}

/// Keep only the rows named by `errors`, in their original order.
///
/// An error without an index refers to the row at the error's own position.
fn select_rejected(rows: Vec<InsertRow>, errors: &[InsertError]) -> Result<Vec<InsertRow>> {
    let rejected: BTreeSet<usize> =
        errors.iter().enumerate().map(|(position, e)| e.index.unwrap_or(position)).collect();

    if let Some(&out_of_range) = rejected.iter().find(|&&index| index >= rows.len()) {
        return Err(BqError::MalformedResponse(format!(
            "insert error index {out_of_range} outside batch of {}",
            rows.len()
        )));
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| rejected.contains(&index).then_some(row))
        .collect())
}

#[cfg(test)]
mod tests {
    use bqstream_domain::InsertConfig;
    use serde_json::json;

    use super::*;
    use crate::testing::Harness;

    fn inserter(h: &Harness, config: InsertConfig) -> RowInserter {
        RowInserter::new(h.gate.clone(), h.endpoints.clone(), config)
    }

    fn table() -> TableReference {
        TableReference::new("proj", "ds", "events")
    }

    fn sent_ids(h: &Harness, request: usize) -> Vec<String> {
        let requests = h.transport.requests();
        let body = requests[request].body.as_ref().unwrap();
        body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["insertId"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn resubmits_only_rejected_rows_with_original_ids() {
        let h = Harness::new();
        h.transport
            .ok(json!({"insertErrors": [
                {"index": 1, "errors": [{"reason": "backendError"}]},
                {"index": 3, "errors": [{"reason": "backendError"}]}
            ]}))
            .ok(json!({}));

        let rows: Vec<_> = (0..4).map(|n| InsertRow::new(json!({ "n": n }))).collect();
        let ids: Vec<_> = rows.iter().map(|r| r.insert_id.clone()).collect();

        assert!(inserter(&h, InsertConfig::default()).insert(&table(), rows).await.unwrap());

        assert_eq!(sent_ids(&h, 0), ids);
        assert_eq!(sent_ids(&h, 1), vec![ids[1].clone(), ids[3].clone()]);
        let resent = h.transport.requests()[1].body.clone().unwrap();
        assert_eq!(resent["rows"][0]["json"], json!({"n": 1}));
        assert_eq!(resent["kind"], "bigquery#tableDataInsertAllRequest");
    }

    #[tokio::test]
    async fn missing_index_falls_back_to_position() {
        let h = Harness::new();
        h.transport.ok(json!({"insertErrors": [{"errors": []}]})).ok(json!({}));

        let rows = vec![
            InsertRow::with_insert_id("a", json!({})),
            InsertRow::with_insert_id("b", json!({})),
        ];
        assert!(inserter(&h, InsertConfig::default()).insert(&table(), rows).await.unwrap());

        assert_eq!(sent_ids(&h, 1), vec!["a"]);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_rounds() {
        let h = Harness::new();
        for _ in 0..3 {
            h.transport.ok(json!({"insertErrors": [{"index": 0}]}));
        }

        let config = InsertConfig { max_resubmits: 2, ..InsertConfig::default() };
        let rows = vec![InsertRow::with_insert_id("stuck", json!({}))];

        assert!(!inserter(&h, config).insert(&table(), rows).await.unwrap());
        assert_eq!(h.transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn splits_into_batches() {
        let h = Harness::new();
        h.transport.ok(json!({})).ok(json!({})).ok(json!({}));

        let config = InsertConfig { max_batch_size: 2, ..InsertConfig::default() };
        let records: Vec<_> = (0..5).map(|n| json!({ "n": n })).collect();

        assert!(inserter(&h, config).insert_json(&table(), records).await.unwrap());

        let sizes: Vec<_> = (0..3).map(|i| sent_ids(&h, i).len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(h.transport.urls().iter().all(|u| u.ends_with("/tables/events/insertAll")));
    }

    #[tokio::test]
    async fn out_of_range_index_is_malformed() {
        let h = Harness::new();
        h.transport.ok(json!({"insertErrors": [{"index": 9}]}));

        let err = inserter(&h, InsertConfig::default())
            .insert(&table(), vec![InsertRow::new(json!({}))])
            .await
            .unwrap_err();
        assert!(matches!(err, BqError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn transport_error_is_terminal() {
        let h = Harness::new();
        h.transport.error(400, "invalid");

        let err = inserter(&h, InsertConfig::default())
            .insert(&table(), vec![InsertRow::new(json!({}))])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
    }

    #[tokio::test]
    async fn empty_input_sends_nothing() {
        let h = Harness::new();
        assert!(inserter(&h, InsertConfig::default()).insert(&table(), Vec::new()).await.unwrap());
        assert!(h.transport.requests().is_empty());
    }
}
