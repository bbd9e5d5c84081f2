//! # bqstream Domain
//!
//! Wire payloads, decoded values and configuration for the bqstream client.
//!
//! This crate contains:
//! - Request/response payload types for datasets, tables, jobs and tabledata
//! - Decoded row and cell types
//! - The client error type and Result alias
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other bqstream crates
//! - No I/O, no async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
