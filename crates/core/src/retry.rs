//! Retry policy for authorization rejections
//!
//! Only 401/403 responses are retried. They usually mean the cached token
//! went stale, so every retry goes out with a freshly minted credential.

use std::time::Duration;

use bqstream_domain::{BqError, RetryConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    stop_on_error: bool,
}

impl AuthRetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, stop_on_error: bool) -> Self {
        Self { max_retries, base_delay, stop_on_error }
    }

    pub fn from_config(config: &RetryConfig, stop_on_error: bool) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms), stop_on_error)
    }

    /// Policy that never retries
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, true)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether `err`, seen after `retries_done` retries, warrants another go.
    pub fn should_retry(&self, err: &BqError, retries_done: u32) -> bool {
        !self.stop_on_error && err.is_transient_auth() && retries_done < self.max_retries
    }

    /// Delay before retry number `retry` (1-based): `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for AuthRetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), false)
    }
}
