//! Client constants
//!
//! Centralized location for wire-level names and default tunables.

// Service endpoints and identity
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/bigquery/v2";
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

// Credential cache
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 5 * 60;

// Auth retry: 3 attempts total, delays of base * 2^retry
pub const DEFAULT_AUTH_MAX_RETRIES: u32 = 2;
pub const DEFAULT_AUTH_BASE_DELAY_MS: u64 = 500;

// Job polling backoff tiers
pub const POLL_FAST_DELAY_MS: u64 = 50;
pub const POLL_MEDIUM_DELAY_MS: u64 = 200;
pub const POLL_SLOW_DELAY_MS: u64 = 2_000;
pub const POLL_TIER_LENGTH: u32 = 4;

// Queries
pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 110_000;

// Streaming inserts
pub const INSERT_ALL_KIND: &str = "bigquery#tableDataInsertAllRequest";
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;
pub const DEFAULT_MAX_RESUBMITS: u32 = 5;

// HTTP
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const AUTHORIZATION_HEADER: &str = "Authorization";
