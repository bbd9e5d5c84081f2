//! Query job resources

use serde::{Deserialize, Serialize};

use super::table::{DatasetReference, TableReference};
use crate::errors::ErrorDetail;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result: Option<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

/// `configuration.query` of a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJobConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_table: Option<TableReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_query_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryJobConfig>,
}

/// Job resource as returned by job insertion and status polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub configuration: JobConfiguration,
}

impl Job {
    /// Job submission payload
    pub fn query(config: QueryJobConfig) -> Self {
        Self {
            job_reference: None,
            status: None,
            configuration: JobConfiguration { query: Some(config) },
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_reference.as_ref().map(|r| r.job_id.as_str())
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status.as_ref().map(|s| s.state), Some(JobState::Done))
    }

    pub fn error_result(&self) -> Option<&ErrorDetail> {
        self.status.as_ref().and_then(|s| s.error_result.as_ref())
    }

    pub fn destination_table(&self) -> Option<&TableReference> {
        self.configuration.query.as_ref().and_then(|q| q.destination_table.as_ref())
    }
}

/// Body of `POST /projects/{p}/queries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub default_dataset: DatasetReference,
    pub use_query_cache: bool,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}
