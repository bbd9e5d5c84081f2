//! HTTP exchange port

pub mod ports;

pub use ports::{HttpMethod, HttpRequest, HttpTransport, RawResponse};
