//! Shared fixtures for the wiremock-backed integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bqstream_core::{ServiceKey, TokenMinter};
use bqstream_domain::{ClientConfig, KeySource, Result};
use bqstream_infra::BigQueryClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const PROJECT_PATH: &str = "/bigquery/v2/projects/proj";

/// Mints `token-1`, `token-2`, ... so retries are observable on the wire.
#[derive(Default)]
pub struct SequenceMinter {
    mints: AtomicUsize,
}

impl SequenceMinter {
    pub fn mints(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMinter for SequenceMinter {
    async fn mint(&self, key: &ServiceKey, issuer: &str, _scope: &str) -> Result<String> {
        assert_eq!(key.as_bytes(), b"test-key");
        assert_eq!(issuer, "svc@proj.iam.gserviceaccount.com");
        let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(
        "proj",
        "ds",
        "svc@proj.iam.gserviceaccount.com",
        KeySource::Inline { key: "test-key".into() },
    )
    .with_table("events")
    .with_base_url(format!("{}/bigquery/v2", server.uri()));
    config.retry.base_delay_ms = 10;
    config
}

pub fn client_with(config: ClientConfig) -> (BigQueryClient, Arc<SequenceMinter>) {
    let minter = Arc::new(SequenceMinter::default());
    let client = BigQueryClient::builder()
        .config(config)
        .minter(minter.clone())
        .build()
        .expect("client should build");
    (client, minter)
}

pub fn client_for(server: &MockServer) -> (BigQueryClient, Arc<SequenceMinter>) {
    client_with(config_for(server))
}

pub fn error_body(code: u16, reason: &str) -> Value {
    json!({"error": {
        "code": code,
        "message": format!("{reason} error"),
        "errors": [{"reason": reason, "message": format!("{reason} error")}]
    }})
}

pub fn table_body(table_id: &str) -> Value {
    json!({
        "tableReference": {"projectId": "proj", "datasetId": "ds", "tableId": table_id},
        "schema": {"fields": [
            {"name": "name", "type": "STRING"},
            {"name": "seen_at", "type": "TIMESTAMP"}
        ]},
        "numRows": "3"
    })
}

pub fn wire_rows(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|n| json!({"f": [{"v": n}, {"v": "1.4143482E9"}]})).collect())
}
