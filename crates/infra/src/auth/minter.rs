use async_trait::async_trait;
use bqstream_core::{ServiceKey, TokenMinter};
use bqstream_domain::Result;

/// Minter that hands out a fixed bearer token.
///
/// Useful against emulators that accept any credential.
#[derive(Clone)]
pub struct StaticTokenMinter {
    token: String,
}

impl StaticTokenMinter {
    /// Always mint `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticTokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenMinter").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenMinter for StaticTokenMinter {
    async fn mint(&self, _key: &ServiceKey, _issuer: &str, _scope: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}
