//! Table data payloads: streaming inserts and paged result sets

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::JobReference;
use super::table::TableSchema;
use crate::constants::INSERT_ALL_KIND;
use crate::errors::ErrorDetail;

/// One row of a streaming insert.
///
/// `insert_id` is minted once when the row is created and travels with the
/// row through every resubmission so the service can deduplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRow {
    pub insert_id: String,
    pub json: serde_json::Value,
}

impl InsertRow {
    pub fn new(json: serde_json::Value) -> Self {
        Self { insert_id: Uuid::new_v4().to_string(), json }
    }

    pub fn with_insert_id(insert_id: impl Into<String>, json: serde_json::Value) -> Self {
        Self { insert_id: insert_id.into(), json }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertAllRequest<'a> {
    pub kind: &'static str,
    pub rows: &'a [InsertRow],
}

impl<'a> InsertAllRequest<'a> {
    pub fn new(rows: &'a [InsertRow]) -> Self {
        Self { kind: INSERT_ALL_KIND, rows }
    }
}

/// Per-row rejection. `index` is the position in the submitted batch; the
/// service may omit it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertAllResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub insert_errors: Vec<InsertError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub v: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRow {
    #[serde(default)]
    pub f: Vec<WireCell>,
}

/// A page of results from either `tabledata.list` or the `queries`
/// endpoint. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<WireRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_complete: Option<bool>,
}

impl ResultPage {
    /// `totalRows` arrives as a decimal string.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows.as_deref().and_then(|s| s.parse().ok())
    }

    /// True when the page carries at least one row.
    pub fn has_rows(&self) -> bool {
        self.rows.as_ref().is_some_and(|rows| !rows.is_empty())
    }
}
