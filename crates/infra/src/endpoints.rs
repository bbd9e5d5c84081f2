//! REST resource URLs

use bqstream_domain::TableReference;

/// Builds resource URLs under a base such as
/// `https://www.googleapis.com/bigquery/v2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
    project_id: String,
}

impl Endpoints {
    /// Endpoints under `base_url` for `project_id`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, project_id: project_id.into() }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Project all URLs are rooted at.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn project(&self) -> String {
        format!("{}/projects/{}", self.base_url, self.project_id)
    }

    /// Dataset collection
    pub fn datasets(&self) -> String {
        format!("{}/datasets", self.project())
    }

    /// One dataset
    pub fn dataset(&self, dataset_id: &str) -> String {
        format!("{}/datasets/{dataset_id}", self.project())
    }

    /// Table collection of a dataset
    pub fn tables(&self, dataset_id: &str) -> String {
        format!("{}/tables", self.dataset(dataset_id))
    }

    /// Table metadata; honours the reference's own project.
    pub fn table(&self, table: &TableReference) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, table.project_id, table.dataset_id, table.table_id
        )
    }

    /// Row data of a table
    pub fn table_data(&self, table: &TableReference) -> String {
        format!("{}/data", self.table(table))
    }

    /// Streaming insert target of a table
    pub fn insert_all(&self, table: &TableReference) -> String {
        format!("{}/insertAll", self.table(table))
    }

    /// Job collection
    pub fn jobs(&self) -> String {
        format!("{}/jobs", self.project())
    }

    /// One job
    pub fn job(&self, job_id: &str) -> String {
        format!("{}/jobs/{job_id}", self.project())
    }

    /// Synchronous query submission
    pub fn queries(&self) -> String {
        format!("{}/queries", self.project())
    }

    /// Results of a job through the queries endpoint
    pub fn query_results(&self, job_id: &str) -> String {
        format!("{}/queries/{job_id}", self.project())
    }
}
