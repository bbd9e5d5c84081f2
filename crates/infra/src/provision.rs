//! Idempotent dataset and table provisioning
//!
//! A 404 from an existence check means "create it". Any other failure is
//! returned unchanged.

use bqstream_domain::{
    BqError, Dataset, DatasetReference, Result, Table, TableReference, TableSchema,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::endpoints::Endpoints;
use crate::request::RequestGate;

/// Idempotent dataset and table creation
pub struct DatasetProvisioner {
    gate: RequestGate,
    endpoints: Endpoints,
    dataset: DatasetReference,
}

impl DatasetProvisioner {
    /// Create a provisioner for `dataset_id`.
    pub fn new(gate: RequestGate, endpoints: Endpoints, dataset_id: impl Into<String>) -> Self {
        let dataset = DatasetReference {
            project_id: endpoints.project_id().to_string(),
            dataset_id: dataset_id.into(),
        };
        Self { gate, endpoints, dataset }
    }

    /// Reference to `table_id` in the provisioned dataset.
    pub fn table_ref(&self, table_id: impl Into<String>) -> TableReference {
        TableReference::new(&self.dataset.project_id, &self.dataset.dataset_id, table_id)
    }

    /// Create the dataset if it does not exist. Returns `true` if created.
    #[instrument(skip(self), fields(dataset = %self.dataset.dataset_id))]
    pub async fn ensure_dataset(&self) -> Result<bool> {
        match self.gate.get_json::<Value>(self.endpoints.dataset(&self.dataset.dataset_id)).await {
            Ok(_) => {
                debug!("dataset exists");
                Ok(false)
            }
            Err(err) if is_missing(&err) => {
                let body = Dataset { dataset_reference: self.dataset.clone() };
                self.gate.post_json::<_, Value>(self.endpoints.datasets(), &body).await?;
                info!("dataset created");
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch table metadata, or `None` if the table does not exist.
    #[instrument(skip(self))]
    pub async fn check_table(&self, table_id: &str) -> Result<Option<Table>> {
        match self.gate.get_json::<Table>(self.endpoints.table(&self.table_ref(table_id))).await {
            Ok(table) => Ok(Some(table)),
            Err(err) if is_missing(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, schema), fields(columns = schema.len()))]
    pub async fn create_table(&self, table_id: &str, schema: TableSchema) -> Result<Table> {
        let body = Table::new(self.table_ref(table_id), schema);
        let created =
            self.gate.post_json(self.endpoints.tables(&self.dataset.dataset_id), &body).await?;
        info!("table created");
        Ok(created)
    }

    /// Ensure the dataset, then the table. Returns `true` if the table was
    /// created by this call.
    pub async fn ensure_table(&self, table_id: &str, schema: TableSchema) -> Result<bool> {
        self.ensure_dataset().await?;

        if self.check_table(table_id).await?.is_some() {
            return Ok(false);
        }
        self.create_table(table_id, schema).await?;
        Ok(true)
    }
}

fn is_missing(err: &BqError) -> bool {
    err.status_code() == Some(404)
}
