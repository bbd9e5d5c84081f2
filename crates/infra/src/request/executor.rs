//! Credentialed HTTP exchange with bounded auth retries

use std::sync::Arc;

use bqstream_core::{AuthRetryPolicy, HttpRequest, HttpTransport};
use bqstream_domain::Result;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::auth::CredentialCache;

/// Runs one request to completion.
///
/// Each attempt attaches the current bearer token. Authorization rejections
/// clear the cached token and retry after `base * 2^retry`; everything else
/// is terminal.
pub struct RetryingExecutor {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialCache>,
    policy: AuthRetryPolicy,
}

impl RetryingExecutor {
    /// Create an executor over `transport`, authenticated by `credentials`.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<CredentialCache>,
        policy: AuthRetryPolicy,
    ) -> Self {
        Self { transport, credentials, policy }
    }

    /// Execute `request`, returning the decoded success body.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted or the error is not
    /// an authorization rejection.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: &HttpRequest) -> Result<Value> {
        let mut retries = 0;

        loop {
            match self.attempt(request).await {
                Ok(body) => {
                    debug!(attempt = retries + 1, "request succeeded");
                    return Ok(body);
                }
                Err(err) if self.policy.should_retry(&err, retries) => {
                    retries += 1;
                    let delay = self.policy.delay_for(retries);
                    warn!(
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "authorization rejected; retrying with a fresh token"
                    );
                    self.credentials.invalidate().await;
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!(attempt = retries + 1, error = %err, kind = err.label(), "request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<Value> {
        let token = self.credentials.get_token().await?;
        let mut request = request.clone();
        request.set_bearer(&token);

        self.transport.exchange(&request).await?.into_result()
    }
}
