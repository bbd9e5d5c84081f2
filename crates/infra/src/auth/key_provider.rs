//! Key material sources
//!
//! Each provider reads its source on every call; the credential cache is
//! responsible for resolving the key once.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bqstream_core::{KeyProvider, ServiceKey};
use bqstream_domain::{BqError, KeySource, Result};
use tracing::debug;

/// Key material already held in memory
#[derive(Debug, Clone)]
pub struct InlineKeyProvider {
    key: ServiceKey,
}

impl InlineKeyProvider {
    /// Wrap key bytes already in memory.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: ServiceKey::new(key) }
    }
}

#[async_trait]
impl KeyProvider for InlineKeyProvider {
    async fn load_key(&self) -> Result<ServiceKey> {
        Ok(self.key.clone())
    }
}

/// Key material read from a file
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    /// Read the key from `path` when asked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeyProvider for FileKeyProvider {
    async fn load_key(&self) -> Result<ServiceKey> {
        debug!(path = %self.path.display(), "reading service key file");

        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            BqError::Auth(format!("failed to read key file {}: {err}", self.path.display()))
        })?;
        if bytes.is_empty() {
            return Err(BqError::Auth(format!("key file {} is empty", self.path.display())));
        }
        Ok(ServiceKey::new(bytes))
    }
}

/// Key material read from an environment variable
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    var_name: String,
}

impl EnvKeyProvider {
    /// Read the key from the environment variable `var_name`.
    pub fn new(var_name: impl Into<String>) -> Self {
        Self { var_name: var_name.into() }
    }
}

#[async_trait]
impl KeyProvider for EnvKeyProvider {
    async fn load_key(&self) -> Result<ServiceKey> {
        match std::env::var(&self.var_name) {
            Ok(value) if !value.is_empty() => Ok(ServiceKey::new(value)),
            _ => Err(BqError::Auth(format!(
                "environment variable {} does not hold a service key",
                self.var_name
            ))),
        }
    }
}

/// Build the provider described by a configured [`KeySource`].
pub fn key_provider_for(source: &KeySource) -> Arc<dyn KeyProvider> {
    match source {
        KeySource::File { path } => Arc::new(FileKeyProvider::new(path.clone())),
        KeySource::Environment { var_name } => Arc::new(EnvKeyProvider::new(var_name.clone())),
        KeySource::Inline { key } => Arc::new(InlineKeyProvider::new(key.as_bytes())),
    }
}
