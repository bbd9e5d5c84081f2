//! # bqstream Core
//!
//! Pure logic and port interfaces for the BigQuery client.
//!
//! This crate contains:
//! - Port traits for the HTTP exchange, key loading and token minting
//! - The query observer seam
//! - The auth retry policy and job polling schedule
//! - Row decoding
//!
//! No I/O happens here; adapters live in `bqstream-infra`.

pub mod auth;
pub mod query;
pub mod retry;
pub mod rows;
pub mod transport;

pub use auth::{KeyProvider, ServiceKey, TokenMinter};
pub use query::{poll_delay, NoopObserver, QueryObserver};
pub use retry::AuthRetryPolicy;
pub use rows::decode_rows;
pub use transport::{HttpMethod, HttpRequest, HttpTransport, RawResponse};
