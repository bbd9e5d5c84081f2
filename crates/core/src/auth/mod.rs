//! Credential ports

pub mod ports;

pub use ports::{KeyProvider, ServiceKey, TokenMinter};
