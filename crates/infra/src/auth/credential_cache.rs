//! Short-lived bearer credential cache
//!
//! Holds at most one minted token. Expiry is checked lazily against the mint
//! instant, so no timer task outlives the cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bqstream_core::{KeyProvider, ServiceKey, TokenMinter};
use bqstream_domain::Result;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::{debug, instrument};

/// A minted token and when it was minted
#[derive(Clone)]
pub(crate) struct Credential {
    token: String,
    minted_at: Instant,
}

impl Credential {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.minted_at.elapsed() < ttl
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("minted_at", &self.minted_at)
            .finish()
    }
}

/// Caches one bearer token for a fixed window after minting.
///
/// The slot lock is held across a mint, so concurrent callers that find the
/// cache empty wait for the single in-flight mint instead of starting their
/// own.
pub struct CredentialCache {
    key_provider: Arc<dyn KeyProvider>,
    minter: Arc<dyn TokenMinter>,
    issuer: String,
    scope: String,
    ttl: Duration,
    key: OnceCell<ServiceKey>,
    slot: Mutex<Option<Credential>>,
}

impl CredentialCache {
    /// Create an empty cache. Nothing is loaded or minted until the first token request.
    pub fn new(
        key_provider: Arc<dyn KeyProvider>,
        minter: Arc<dyn TokenMinter>,
        issuer: impl Into<String>,
        scope: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            key_provider,
            minter,
            issuer: issuer.into(),
            scope: scope.into(),
            ttl,
            key: OnceCell::new(),
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token, minting a new one if absent or expired.
    ///
    /// # Errors
    /// Propagates key loading and minting failures. A failed key load is
    /// retried on the next call.
    #[instrument(skip(self), fields(issuer = %self.issuer))]
    pub async fn get_token(&self) -> Result<String> {
        let mut slot = self.slot.lock().await;

        if let Some(credential) = slot.as_ref().filter(|c| c.is_fresh(self.ttl)) {
            return Ok(credential.token.clone());
        }

        let key = self.key.get_or_try_init(|| self.key_provider.load_key()).await?;
        let token = self.minter.mint(key, &self.issuer, &self.scope).await?;
        debug!(ttl_secs = self.ttl.as_secs(), "minted bearer token");

        *slot = Some(Credential { token: token.clone(), minted_at: Instant::now() });
        Ok(token)
    }

    /// Drop the cached token so the next call mints a fresh one.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            debug!("cached bearer token invalidated");
        }
    }

    /// How long a minted token is reused.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("issuer", &self.issuer)
            .field("scope", &self.scope)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
