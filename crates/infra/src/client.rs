//! Client facade
//!
//! [`BigQueryClient`] wires the credential cache, the auth-retrying
//! executor and the single-flight gate together once, then hands out the
//! inserter, the provisioner and query jobs that share them.

use std::sync::Arc;
use std::time::Duration;

use bqstream_core::{
    AuthRetryPolicy, HttpTransport, KeyProvider, NoopObserver, QueryObserver, TokenMinter,
};
use bqstream_domain::{
    BqError, ClientConfig, DatasetReference, InsertRow, Result, Table, TableReference,
    TableSchema,
};
use futures::Sink;
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::{key_provider_for, CredentialCache};
use crate::endpoints::Endpoints;
use crate::http::ReqwestTransport;
use crate::provision::DatasetProvisioner;
use crate::query::{QueryJob, QueryOptions};
use crate::request::{RequestGate, RetryingExecutor};
use crate::tabledata::{self, RowInserter};

/// Entry point for inserts, provisioning and queries against one project and dataset
pub struct BigQueryClient {
    config: ClientConfig,
    endpoints: Endpoints,
    credentials: Arc<CredentialCache>,
    gate: RequestGate,
}

impl BigQueryClient {
    /// Start building a client.
    pub fn builder() -> BigQueryClientBuilder {
        BigQueryClientBuilder::default()
    }

    /// The validated configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL builder for the configured project.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The gate every call from this client goes through.
    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    /// The shared credential cache.
    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    /// Reference to the configured dataset.
    pub fn dataset_ref(&self) -> DatasetReference {
        DatasetReference {
            project_id: self.config.project_id.clone(),
            dataset_id: self.config.dataset_id.clone(),
        }
    }

    /// Reference to `table_id` in the configured dataset.
    pub fn table_ref(&self, table_id: impl Into<String>) -> TableReference {
        TableReference::new(&self.config.project_id, &self.config.dataset_id, table_id)
    }

    fn default_table(&self) -> Result<TableReference> {
        self.config
            .table_id
            .as_deref()
            .map(|table_id| self.table_ref(table_id))
            .ok_or_else(|| BqError::Config("no default table_id configured".into()))
    }

    /// A row inserter sharing this client's gate.
    pub fn inserter(&self) -> RowInserter {
        RowInserter::new(self.gate.clone(), self.endpoints.clone(), self.config.insert.clone())
    }

    /// A provisioner for the configured dataset.
    pub fn provisioner(&self) -> DatasetProvisioner {
        DatasetProvisioner::new(
            self.gate.clone(),
            self.endpoints.clone(),
            self.config.dataset_id.clone(),
        )
    }

    /// Insert JSON records into the configured default table.
    ///
    /// # Errors
    /// `BqError::Config` when no default table is configured.
    pub async fn insert(&self, records: Vec<Value>) -> Result<bool> {
        let table = self.default_table()?;
        self.inserter().insert_json(&table, records).await
    }

    /// Insert rows, with caller-chosen insert ids, into `table_id`.
    pub async fn insert_into(&self, table_id: &str, rows: Vec<InsertRow>) -> Result<bool> {
        self.inserter().insert(&self.table_ref(table_id), rows).await
    }

    /// A sink writing records into the configured default table.
    ///
    /// # Errors
    /// `BqError::Config` when no default table is configured.
    pub fn insert_sink(&self) -> Result<impl Sink<Value, Error = BqError> + Send> {
        let table = self.default_table()?;
        Ok(tabledata::insert_sink(self.inserter(), table))
    }

    /// Create the configured dataset if it is missing. Returns `true` when it was created.
    pub async fn ensure_dataset(&self) -> Result<bool> {
        self.provisioner().ensure_dataset().await
    }

    /// Ensure the dataset and the default table exist.
    pub async fn ensure_table(&self, schema: TableSchema) -> Result<bool> {
        let table = self.default_table()?;
        self.provisioner().ensure_table(&table.table_id, schema).await
    }

    /// Fetch table metadata, `None` when the table does not exist.
    pub async fn check_table(&self, table_id: &str) -> Result<Option<Table>> {
        self.provisioner().check_table(table_id).await
    }

    /// Create `table_id` with `schema` in the configured dataset.
    pub async fn create_table(&self, table_id: &str, schema: TableSchema) -> Result<Table> {
        self.provisioner().create_table(table_id, schema).await
    }

    /// Start a query. No request is made until the job is first polled.
    pub fn query(&self, options: QueryOptions) -> QueryJob {
        self.query_with_observer(options, Arc::new(NoopObserver))
    }

    /// Start a query whose events are reported to `observer`.
    pub fn query_with_observer(
        &self,
        options: QueryOptions,
        observer: Arc<dyn QueryObserver>,
    ) -> QueryJob {
        QueryJob::new(
            self.gate.clone(),
            self.endpoints.clone(),
            self.dataset_ref(),
            &self.config.query,
            options,
            observer,
        )
    }
}

/// Builder for [`BigQueryClient`]
///
/// A config and a token minter are required. The transport defaults to
/// reqwest and the key provider to the configured key source.
#[derive(Default)]
pub struct BigQueryClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    key_provider: Option<Arc<dyn KeyProvider>>,
    minter: Option<Arc<dyn TokenMinter>>,
}

impl BigQueryClientBuilder {
    /// Client configuration (required)
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default reqwest transport
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the key source derived from the config
    pub fn key_provider(mut self, key_provider: Arc<dyn KeyProvider>) -> Self {
        self.key_provider = Some(key_provider);
        self
    }

    /// Token minter (required)
    pub fn minter(mut self, minter: Arc<dyn TokenMinter>) -> Self {
        self.minter = Some(minter);
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// `BqError::Config` when the config or minter is missing or the config
    /// fails validation; transport construction errors are passed through.
    #[instrument(skip(self))]
    pub fn build(self) -> Result<BigQueryClient> {
        let config = self.config.ok_or_else(|| BqError::Config("client config not set".into()))?;
        config.validate()?;
        let minter = self.minter.ok_or_else(|| BqError::Config("token minter not set".into()))?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .timeout(Duration::from_secs(config.request_timeout_secs))
                    .build()?,
            ),
        };
        let key_provider = self.key_provider.unwrap_or_else(|| key_provider_for(&config.key));

        let credentials = Arc::new(CredentialCache::new(
            key_provider,
            minter,
            config.service_account.clone(),
            config.scope.clone(),
            Duration::from_secs(config.token_ttl_secs),
        ));
        let policy = AuthRetryPolicy::from_config(&config.retry, config.stop_on_error);
        let executor = RetryingExecutor::new(transport, credentials.clone(), policy);
        let endpoints = Endpoints::new(&config.base_url, &config.project_id);

        info!(
            project = %config.project_id,
            dataset = %config.dataset_id,
            base_url = %endpoints.base_url(),
            "client ready"
        );

        Ok(BigQueryClient { gate: RequestGate::new(executor), endpoints, credentials, config })
    }
}

#[cfg(test)]
mod tests {
    use bqstream_domain::{KeySource, QueryEvent};
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::query::Page;
    use crate::testing::{CountingMinter, ScriptedTransport, BASE};

    fn config() -> ClientConfig {
        ClientConfig::new("proj", "ds", "svc@proj.iam", KeySource::Inline { key: "k".into() })
            .with_table("events")
            .with_base_url(BASE)
    }

    fn client(config: ClientConfig) -> (BigQueryClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let client = BigQueryClient::builder()
            .config(config)
            .transport(transport.clone())
            .minter(Arc::new(CountingMinter::new()))
            .build()
            .unwrap();
        (client, transport)
    }

    #[test]
    fn build_requires_config_and_minter() {
        let err = BigQueryClient::builder().build().err().unwrap();
        assert!(matches!(err, BqError::Config(_)));

        let err = BigQueryClient::builder().config(config()).build().err().unwrap();
        assert!(matches!(err, BqError::Config(m) if m.contains("minter")));
    }

    #[test]
    fn build_validates_config() {
        let mut bad = config();
        bad.project_id = String::new();

        let err = BigQueryClient::builder()
            .config(bad)
            .minter(Arc::new(CountingMinter::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, BqError::Config(m) if m.contains("project_id")));
    }

    #[tokio::test]
    async fn insert_targets_default_table_with_bearer() {
        let (client, transport) = client(config());
        transport.ok(json!({}));

        assert!(client.insert(vec![json!({"name": "a"})]).await.unwrap());

        let request = &transport.requests()[0];
        assert_eq!(request.url, format!("{BASE}/projects/proj/datasets/ds/tables/events/insertAll"));
        assert_eq!(request.header("Authorization"), Some("Bearer token-1"));
    }

    #[tokio::test]
    async fn insert_without_default_table_is_config_error() {
        let mut config = config();
        config.table_id = None;
        let (client, transport) = client(config);

        let err = client.insert(vec![json!({})]).await.unwrap_err();
        assert!(matches!(err, BqError::Config(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn query_uses_client_dataset_and_observer() {
        let (client, transport) = client(config());
        transport.ok(json!({"jobReference": {"jobId": "job_9"}}));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut job = client.query_with_observer(QueryOptions::sql("SELECT 1"), Arc::new(tx));

        assert_eq!(job.next_page().await.unwrap(), Page::Pending);
        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(
            body["configuration"]["query"]["defaultDataset"],
            json!({"projectId": "proj", "datasetId": "ds"})
        );
        assert_eq!(rx.try_recv().unwrap(), QueryEvent::JobId("job_9".into()));
    }
}
