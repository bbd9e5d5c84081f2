//! # bqstream Infrastructure
//!
//! I/O-performing implementations behind the core ports, and the client
//! built from them.
//!
//! This crate contains:
//! - The reqwest HTTP transport and key sources
//! - The credential cache, retrying executor and single-flight request gate
//! - Streaming inserts, dataset/table provisioning and query jobs
//! - The [`BigQueryClient`] facade, config loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `bqstream-core`
//! - Every outbound call goes through one [`RequestGate`] per client

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod observability;
pub mod provision;
pub mod query;
pub mod request;
pub mod tabledata;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use auth::{CredentialCache, StaticTokenMinter};
pub use client::{BigQueryClient, BigQueryClientBuilder};
pub use endpoints::Endpoints;
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::init_tracing;
pub use provision::DatasetProvisioner;
pub use query::{Page, QueryJob, QueryOptions, QueryState};
pub use request::{RequestGate, RetryingExecutor};
pub use tabledata::{insert_sink, RowInserter};
