//! Query job lifecycle
//!
//! A [`QueryJob`] is a pull-based cursor over a query's results. Every call
//! to [`QueryJob::next_page`] performs at most one unit of I/O: a job
//! submission, one status poll, one table resolution or one page fetch.
//!
//! Results normally come from the job's destination table. Two recoveries
//! happen inside the cursor instead of surfacing as errors:
//! - a caller-supplied job id the service no longer knows is dropped and the
//!   query restarts from the caller's table or SQL;
//! - a missing permanent destination table is created by resubmitting the
//!   query with that table as its destination.

use std::sync::Arc;

use bqstream_core::{decode_rows, poll_delay, HttpRequest, QueryObserver};
use bqstream_domain::{
    BqError, DatasetReference, ErrorDetail, Job, JobReference, QueryConfig, QueryJobConfig,
    QueryRequest, Result, ResultPage, ResultsPath, Row, Table, TableReference, TableSchema,
};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info, instrument, warn};

use super::options::QueryOptions;
use crate::endpoints::Endpoints;
use crate::request::RequestGate;

const CREATE_IF_NEEDED: &str = "CREATE_IF_NEEDED";

/// Outcome of one [`QueryJob::next_page`] call
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// A decoded page of rows
    Rows(Vec<Row>),
    /// Progress was made but no rows are available yet
    Pending,
    /// No more rows will be produced
    Done,
}

/// Observable cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Nothing requested yet
    NotStarted,
    /// Waiting for the job to finish
    PollingJob,
    /// Fetching destination table metadata and the first page
    ResolvingTable,
    /// Paging through the destination table
    PagingTableData,
    /// Paging through the queries endpoint
    PagingQueryUrl,
    /// No more rows
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    NotStarted,
    PollingJob,
    ResolvingTable,
    PagingTableData { url: String },
    PagingQueryUrl { url: String },
    Exhausted,
}

impl Cursor {
    fn state(&self) -> QueryState {
        match self {
            Self::NotStarted => QueryState::NotStarted,
            Self::PollingJob => QueryState::PollingJob,
            Self::ResolvingTable => QueryState::ResolvingTable,
            Self::PagingTableData { .. } => QueryState::PagingTableData,
            Self::PagingQueryUrl { .. } => QueryState::PagingQueryUrl,
            Self::Exhausted => QueryState::Exhausted,
        }
    }
}

/// Pull-based cursor over one query's results
pub struct QueryJob {
    gate: RequestGate,
    endpoints: Endpoints,
    observer: Arc<dyn QueryObserver>,

    default_dataset: DatasetReference,
    sql: Option<String>,
    use_query_cache: bool,
    timeout_ms: u64,
    max_results: Option<u32>,
    results_path: ResultsPath,

    /// Table named by the caller, directly or as a permanent destination
    caller_table: Option<TableReference>,
    permanent_table: Option<TableReference>,
    create_table: bool,
    destination_directive: Option<TableReference>,
    directive_used: bool,

    job_id: Option<String>,
    job_location: Option<String>,
    external_job: bool,
    destination: Option<TableReference>,

    cursor: Cursor,
    page_token: Option<String>,
    schema: Option<TableSchema>,
    poll_attempts: u32,
    total_rows: Option<u64>,
}

impl QueryJob {
    /// Create a cursor. No request is made until the first [`next_page`](Self::next_page).
    pub fn new(
        gate: RequestGate,
        endpoints: Endpoints,
        default_dataset: DatasetReference,
        config: &QueryConfig,
        options: QueryOptions,
        observer: Arc<dyn QueryObserver>,
    ) -> Self {
        let permanent_table = options.permanent_table.map(|table_id| {
            TableReference::new(&default_dataset.project_id, &default_dataset.dataset_id, table_id)
        });
        let caller_table = options.destination.or_else(|| permanent_table.clone());

        Self {
            gate,
            endpoints,
            observer,
            default_dataset,
            sql: options.sql,
            use_query_cache: config.use_query_cache,
            timeout_ms: config.timeout_ms,
            max_results: options.max_results.or(config.max_results),
            results_path: options.results_path.unwrap_or(config.results_path),
            destination: caller_table.clone(),
            caller_table,
            permanent_table,
            create_table: options.create_table,
            destination_directive: None,
            directive_used: false,
            external_job: options.job_id.is_some(),
            job_id: options.job_id,
            job_location: None,
            cursor: Cursor::NotStarted,
            page_token: None,
            schema: None,
            poll_attempts: 0,
            total_rows: None,
        }
    }

    /// Current cursor position.
    pub fn state(&self) -> QueryState {
        self.cursor.state()
    }

    /// Id of the job being read, once known.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Table the results are read from, once known.
    pub fn destination(&self) -> Option<&TableReference> {
        self.destination.as_ref()
    }

    /// Result schema, once resolved.
    pub fn schema(&self) -> Option<&TableSchema> {
        self.schema.as_ref()
    }

    /// Total row count reported by the service, once known.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    /// Whether every row has been produced.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Advance the cursor by one unit of I/O.
    ///
    /// # Errors
    /// A failed job ends the cursor with `BqError::Job`. Other errors leave
    /// the cursor where it was, except where a recovery applies.
    #[instrument(skip(self), fields(state = ?self.cursor.state()))]
    pub async fn next_page(&mut self) -> Result<Page> {
        if self.cursor == Cursor::NotStarted {
            self.begin()?;
        }

        match self.cursor.clone() {
            Cursor::NotStarted => self.submit().await,
            Cursor::PollingJob => self.poll_job().await,
            Cursor::ResolvingTable => self.resolve_table().await,
            Cursor::PagingTableData { url } => self.fetch_table_page(&url).await,
            Cursor::PagingQueryUrl { url } => self.fetch_query_page(&url).await,
            Cursor::Exhausted => Ok(Page::Done),
        }
    }

    /// Drive the cursor until it yields rows (`Some`) or ends (`None`).
    pub async fn next_rows(&mut self) -> Result<Option<Vec<Row>>> {
        loop {
            match self.next_page().await? {
                Page::Rows(rows) => return Ok(Some(rows)),
                Page::Pending => {}
                Page::Done => return Ok(None),
            }
        }
    }

    /// Flatten the remaining results into a stream of rows.
    pub fn into_stream(self) -> impl Stream<Item = Result<Row>> + Send {
        stream::try_unfold(self, |mut job| async move {
            let rows = job.next_rows().await?;
            Ok::<_, BqError>(rows.map(|rows| (stream::iter(rows.into_iter().map(Ok::<Row, BqError>)), job)))
        })
        .try_flatten()
    }

    /// Pick the entry point. No I/O.
    fn begin(&mut self) -> Result<()> {
        if let Some(job_id) = self.job_id.clone() {
            self.observer.on_job_id(&job_id);
            self.cursor = match self.results_path {
                ResultsPath::DestinationTable => Cursor::PollingJob,
                ResultsPath::QueryEndpoint => {
                    Cursor::PagingQueryUrl { url: self.endpoints.query_results(&job_id) }
                }
            };
        } else if self.destination.is_some() {
            self.cursor = Cursor::ResolvingTable;
        } else if self.sql.is_none() {
            return Err(BqError::InvalidInput(
                "a query needs SQL, a job id or a destination table".into(),
            ));
        }
        Ok(())
    }

    async fn submit(&mut self) -> Result<Page> {
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| BqError::InvalidInput("no SQL to submit".into()))?;

        // The queries endpoint cannot target a destination table.
        if self.destination_directive.is_none() && self.results_path == ResultsPath::QueryEndpoint
        {
            return self.submit_query(sql).await;
        }

        // Kept until a job is adopted so a failed submission can be retried.
        let destination_table = self.destination_directive.clone();
        let body = Job::query(QueryJobConfig {
            query: Some(sql),
            default_dataset: Some(self.default_dataset.clone()),
            create_disposition: destination_table.as_ref().map(|_| CREATE_IF_NEEDED.to_string()),
            destination_table,
            use_query_cache: Some(self.use_query_cache),
            write_disposition: None,
        });

        let job: Job = self.gate.post_json(self.endpoints.jobs(), &body).await?;
        let reference = job.job_reference.ok_or_else(|| {
            BqError::MalformedResponse("job submission returned no jobReference".into())
        })?;
        self.destination_directive = None;
        self.adopt_job(reference);
        self.cursor = Cursor::PollingJob;
        Ok(Page::Pending)
    }

    async fn submit_query(&mut self, sql: String) -> Result<Page> {
        let body = QueryRequest {
            query: sql,
            default_dataset: self.default_dataset.clone(),
            use_query_cache: self.use_query_cache,
            timeout_ms: self.timeout_ms,
            max_results: self.max_results,
        };

        let page: ResultPage = self.gate.post_json(self.endpoints.queries(), &body).await?;
        let reference = page.job_reference.clone().ok_or_else(|| {
            BqError::MalformedResponse("query response carried no jobReference".into())
        })?;
        let url = self.endpoints.query_results(&reference.job_id);
        self.adopt_job(reference);
        self.cursor = Cursor::PagingQueryUrl { url };
        self.accept_query_page(page).await
    }

    fn adopt_job(&mut self, reference: JobReference) {
        info!(job_id = %reference.job_id, "query job submitted");
        self.observer.on_job_id(&reference.job_id);
        self.job_id = Some(reference.job_id);
        self.job_location = reference.location;
        self.poll_attempts = 0;
    }

    async fn poll_job(&mut self) -> Result<Page> {
        let job_id =
            self.job_id.clone().ok_or_else(|| BqError::Internal("polling without a job id".into()))?;
        let request = self.with_location(HttpRequest::get(self.endpoints.job(&job_id)));

        let job: Job = match self.gate.call(request).await {
            Ok(job) => job,
            Err(err) if self.external_job && err.is_not_found() => {
                self.forget_external_job(&err);
                return Ok(Page::Pending);
            }
            Err(err) => return Err(err),
        };

        if !job.is_done() {
            return Ok(self.poll_tick().await);
        }

        self.observer.on_job(&job);

        if let Some(failure) = job.error_result() {
            self.cursor = Cursor::Exhausted;
            let err = job_failure(&job, failure);
            warn!(job_id = %job_id, error = %err, "query job failed");
            return Err(err);
        }

        let destination = job.destination_table().cloned().ok_or_else(|| {
            BqError::MalformedResponse(format!("job {job_id} finished without a destination table"))
        })?;
        debug!(job_id = %job_id, destination = %destination, "query job done");
        self.observer.on_destination(&destination);
        self.destination = Some(destination);
        self.cursor = Cursor::ResolvingTable;
        Ok(Page::Pending)
    }

    async fn poll_tick(&mut self) -> Page {
        self.poll_attempts += 1;
        let delay = poll_delay(self.poll_attempts);
        debug!(
            attempt = self.poll_attempts,
            delay_ms = delay.as_millis() as u64,
            "job still running"
        );
        tokio::time::sleep(delay).await;
        Page::Pending
    }

    /// Fetch table metadata and the first data page together.
    async fn resolve_table(&mut self) -> Result<Page> {
        let table_ref = self
            .destination
            .clone()
            .ok_or_else(|| BqError::Internal("resolving without a destination".into()))?;
        let data_url = self.endpoints.table_data(&table_ref);

        let resolved = futures::try_join!(
            self.gate.get_json::<Table>(self.endpoints.table(&table_ref)),
            self.gate.call::<ResultPage>(self.page_request(&data_url)),
        );
        let (table, page) = match resolved {
            Ok(resolved) => resolved,
            Err(err) if err.is_not_found() => return self.table_missing(&table_ref, &err),
            Err(err) => return Err(err),
        };

        let schema = table.schema.clone().ok_or_else(|| {
            BqError::MalformedResponse(format!("table {table_ref} has no schema"))
        })?;
        debug!(table = %table_ref, columns = schema.len(), "destination table resolved");

        self.observer.on_table(&table);
        self.total_rows = table.num_rows.as_deref().and_then(|n| n.parse().ok());
        self.schema = Some(schema);
        self.cursor = Cursor::PagingTableData { url: data_url };
        self.consume_page(page)
    }

    fn table_missing(&mut self, table_ref: &TableReference, err: &BqError) -> Result<Page> {
        if self.external_job {
            self.forget_external_job(err);
            return Ok(Page::Pending);
        }

        let can_create = self.create_table
            && !self.directive_used
            && self.sql.is_some()
            && self.permanent_table.as_ref() == Some(table_ref);
        if can_create {
            info!(table = %table_ref, "destination table missing; resubmitting query to create it");
            self.destination_directive = Some(table_ref.clone());
            self.directive_used = true;
            self.destination = None;
            self.cursor = Cursor::NotStarted;
            return Ok(Page::Pending);
        }

        Err(err.clone())
    }

    async fn fetch_table_page(&mut self, url: &str) -> Result<Page> {
        let page: ResultPage = self.gate.call(self.page_request(url)).await?;
        self.consume_page(page)
    }

    async fn fetch_query_page(&mut self, url: &str) -> Result<Page> {
        let request = self.with_location(self.page_request(url));

        let page: ResultPage = match self.gate.call(request).await {
            Ok(page) => page,
            Err(err) if self.external_job && err.is_not_found() => {
                self.forget_external_job(&err);
                return Ok(Page::Pending);
            }
            Err(err) => return Err(err),
        };
        self.accept_query_page(page).await
    }

    async fn accept_query_page(&mut self, page: ResultPage) -> Result<Page> {
        if page.job_complete == Some(false) {
            return Ok(self.poll_tick().await);
        }
        self.consume_page(page)
    }

    fn consume_page(&mut self, page: ResultPage) -> Result<Page> {
        if let Some(total) = page.total_rows() {
            self.total_rows = Some(total);
        }
        let ResultPage { schema, rows, page_token, .. } = page;
        if self.schema.is_none() {
            self.schema = schema;
        }
        self.page_token = page_token;

        let rows = match rows {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                self.finish();
                return Ok(Page::Done);
            }
        };

        let schema = self.schema.as_ref().ok_or_else(|| {
            BqError::MalformedResponse("result page has rows but no schema".into())
        })?;
        let decoded = decode_rows(schema, &rows)?;
        debug!(rows = decoded.len(), more = self.page_token.is_some(), "result page decoded");

        if self.page_token.is_none() {
            self.finish();
        }
        Ok(Page::Rows(decoded))
    }

    fn page_request(&self, url: &str) -> HttpRequest {
        let mut request = HttpRequest::get(url);
        if let Some(max_results) = self.max_results {
            request = request.with_query("maxResults", max_results);
        }
        if let Some(token) = &self.page_token {
            request = request.with_query("pageToken", token);
        }
        request
    }

    fn with_location(&self, request: HttpRequest) -> HttpRequest {
        match &self.job_location {
            Some(location) => request.with_query("location", location),
            None => request,
        }
    }

    /// Drop a job the service no longer recognises and start over.
    fn forget_external_job(&mut self, err: &BqError) {
        warn!(job_id = ?self.job_id, error = %err, "job no longer available; restarting query");
        self.job_id = None;
        self.job_location = None;
        self.external_job = false;
        self.destination = self.caller_table.clone();
        self.page_token = None;
        self.schema = None;
        self.poll_attempts = 0;
        self.cursor = Cursor::NotStarted;
    }

    fn finish(&mut self) {
        if self.cursor != Cursor::Exhausted {
            self.cursor = Cursor::Exhausted;
            info!(job_id = ?self.job_id, total_rows = ?self.total_rows, "query results exhausted");
            self.observer.on_exhausted();
        }
    }
}

fn job_failure(job: &Job, failure: &ErrorDetail) -> BqError {
    let message = failure
        .message
        .clone()
        .or_else(|| failure.reason.clone())
        .unwrap_or_else(|| "query job failed".to_string());
    let errors = job
        .status
        .as_ref()
        .map(|status| status.errors.clone())
        .filter(|errors| !errors.is_empty())
        .unwrap_or_else(|| vec![failure.clone()]);
    BqError::Job { message, errors }
}
