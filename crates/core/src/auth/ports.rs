//! Port interfaces for key material and token minting

use std::fmt;

use async_trait::async_trait;
use bqstream_domain::Result;

/// Service account key material.
///
/// Opaque to this crate; only the [`TokenMinter`] interprets it.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceKey(Vec<u8>);

impl ServiceKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Trait for resolving key material.
///
/// Callers resolve the key at most once per process; implementations do not
/// need to cache.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn load_key(&self) -> Result<ServiceKey>;
}

/// Trait for exchanging key material for a bearer token
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint a bearer token for `issuer` limited to `scope`.
    async fn mint(&self, key: &ServiceKey, issuer: &str, scope: &str) -> Result<String>;
}
