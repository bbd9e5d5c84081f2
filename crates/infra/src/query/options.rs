use bqstream_domain::{ResultsPath, TableReference};

/// What a [`QueryJob`](super::QueryJob) should run or resume.
///
/// At least one of `sql`, `job_id` or a table must be set. When several are
/// present the job id is tried first, then the table, then a fresh
/// submission of `sql`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub sql: Option<String>,
    /// Resume an existing job instead of submitting a new one
    pub job_id: Option<String>,
    /// Read an existing table directly
    pub destination: Option<TableReference>,
    /// Permanent table (in the client's dataset) that receives the results.
    /// Read directly when it exists; otherwise the query is submitted with
    /// it as destination.
    pub permanent_table: Option<String>,
    /// Allow a missing permanent table to be created by the query
    pub create_table: bool,
    /// Overrides the configured page size
    pub max_results: Option<u32>,
    /// Overrides the configured results path
    pub results_path: Option<ResultsPath>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            sql: None,
            job_id: None,
            destination: None,
            permanent_table: None,
            create_table: true,
            max_results: None,
            results_path: None,
        }
    }
}

impl QueryOptions {
    /// Run `sql` as a new job.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self { sql: Some(sql.into()), ..Self::default() }
    }

    /// Read the results of an existing job.
    pub fn job(job_id: impl Into<String>) -> Self {
        Self { job_id: Some(job_id.into()), ..Self::default() }
    }

    /// Read an existing table.
    pub fn table(table: TableReference) -> Self {
        Self { destination: Some(table), ..Self::default() }
    }

    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    #[must_use]
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    #[must_use]
    pub fn with_permanent_table(mut self, table_id: impl Into<String>) -> Self {
        self.permanent_table = Some(table_id.into());
        self
    }

    #[must_use]
    pub fn without_table_creation(mut self) -> Self {
        self.create_table = false;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    #[must_use]
    pub fn with_results_path(mut self, path: ResultsPath) -> Self {
        self.results_path = Some(path);
        self
    }
}
