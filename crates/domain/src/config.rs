//! Client configuration structures
//!
//! Every tunable has a default so a config file only needs the identifiers.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BIGQUERY_SCOPE, DEFAULT_AUTH_BASE_DELAY_MS, DEFAULT_AUTH_MAX_RETRIES, DEFAULT_BASE_URL,
    DEFAULT_INSERT_BATCH_SIZE, DEFAULT_MAX_RESUBMITS, DEFAULT_MAX_RESULTS,
    DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_SECS,
};
use crate::errors::{BqError, Result};
use crate::impl_config_enum_conversions;

/// Where the service account key comes from
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KeySource {
    /// Read once from a file on first use
    File { path: PathBuf },
    /// Read once from an environment variable
    Environment { var_name: String },
    /// Key material supplied directly
    Inline { key: String },
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
            Self::Environment { var_name } => {
                f.debug_struct("Environment").field("var_name", var_name).finish()
            }
            Self::Inline { .. } => f.debug_struct("Inline").field("key", &"<redacted>").finish(),
        }
    }
}

/// How query results are retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsPath {
    /// Submit a job, poll it, then page the materialized destination table
    #[default]
    DestinationTable,
    /// Use the synchronous `queries` endpoint and page its results URL
    QueryEndpoint,
}

impl_config_enum_conversions!(ResultsPath {
    DestinationTable => "destination_table",
    QueryEndpoint => "query_endpoint",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl_config_enum_conversions!(LogFormat {
    Compact => "compact",
    Json => "json",
});

/// Auth retry tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay_ms * 2^n`
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: DEFAULT_AUTH_MAX_RETRIES, base_delay_ms: DEFAULT_AUTH_BASE_DELAY_MS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size limit sent as `maxResults`; `None` lets the service decide
    pub max_results: Option<u32>,
    pub use_query_cache: bool,
    pub timeout_ms: u64,
    pub results_path: ResultsPath,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
            use_query_cache: true,
            timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            results_path: ResultsPath::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    pub max_batch_size: usize,
    /// Resubmission rounds for rejected rows before giving up on a batch
    pub max_resubmits: u32,
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self { max_batch_size: DEFAULT_INSERT_BATCH_SIZE, max_resubmits: DEFAULT_MAX_RESUBMITS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub project_id: String,
    pub dataset_id: String,
    /// Default table for inserts and provisioning
    #[serde(default)]
    pub table_id: Option<String>,
    /// Service account email, used as the token issuer
    pub service_account: String,
    pub key: KeySource,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Fail on the first error instead of retrying auth rejections
    #[serde(default)]
    pub stop_on_error: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub insert: InsertConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_scope() -> String {
    BIGQUERY_SCOPE.to_string()
}

const fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    /// Minimal configuration; everything else takes its default.
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        service_account: impl Into<String>,
        key: KeySource,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: None,
            service_account: service_account.into(),
            key,
            base_url: default_base_url(),
            scope: default_scope(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            stop_on_error: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetryConfig::default(),
            query: QueryConfig::default(),
            insert: InsertConfig::default(),
            log: LogConfig::default(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reject configurations that can never produce a working client.
    ///
    /// # Errors
    /// Returns `BqError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("project_id", &self.project_id),
            ("dataset_id", &self.dataset_id),
            ("service_account", &self.service_account),
            ("base_url", &self.base_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(BqError::Config(format!("{field} must not be empty")));
            }
        }
        if matches!(self.table_id.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(BqError::Config("table_id must not be empty when set".into()));
        }
        if self.insert.max_batch_size == 0 {
            return Err(BqError::Config("insert.max_batch_size must be positive".into()));
        }
        if self.token_ttl_secs == 0 {
            return Err(BqError::Config("token_ttl_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientConfig {
        ClientConfig::new(
            "proj",
            "events",
            "svc@proj.iam.gserviceaccount.com",
            KeySource::Inline { key: "secret".into() },
        )
    }

    #[test]
    fn defaults_match_service_conventions() {
        let config = sample();
        assert_eq!(config.token_ttl_secs, 300);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.query.max_results, Some(100));
        assert_eq!(config.query.results_path, ResultsPath::DestinationTable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_identifiers() {
        let mut config = sample();
        config.dataset_id = "  ".into();
        assert!(matches!(config.validate(), Err(BqError::Config(msg)) if msg.contains("dataset_id")));

        let config = sample().with_table("");
        assert!(config.validate().is_err());

        let mut config = sample();
        config.insert.max_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inline_key_is_redacted_in_debug() {
        let rendered = format!("{:?}", sample().key);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "project_id": "p",
                "dataset_id": "d",
                "service_account": "svc@p",
                "key": { "source": "file", "path": "/etc/key.pem" },
                "query": { "results_path": "query_endpoint" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.key, KeySource::File { path: PathBuf::from("/etc/key.pem") });
        assert_eq!(config.query.results_path, ResultsPath::QueryEndpoint);
        assert_eq!(config.query.timeout_ms, 110_000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
