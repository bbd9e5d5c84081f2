//! Conversions from external infrastructure errors into domain errors.

use std::io;

use bqstream_domain::BqError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BqError);

impl From<InfraError> for BqError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BqError> for InfraError {
    fn from(value: BqError) -> Self {
        InfraError(value)
    }
}

/// Convert any supported infrastructure error straight into a `BqError`.
pub(crate) fn to_bq<E: Into<InfraError>>(err: E) -> BqError {
    err.into().0
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BqError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_timeout() {
            return InfraError(BqError::Transport("HTTP request timed out".into()));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if value.is_connect() {
            return InfraError(BqError::Transport(format!("HTTP connection failure: {value}")));
        }

        if value.is_builder() {
            return InfraError(BqError::InvalidInput(format!("invalid HTTP request: {value}")));
        }

        if value.is_decode() {
            return InfraError(BqError::MalformedResponse(format!(
                "failed to decode response body: {value}"
            )));
        }

        if let Some(status) = value.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return InfraError(BqError::api(code, message));
        }

        InfraError(BqError::Transport(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → BqError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match value.classify() {
            Category::Io => InfraError(BqError::Transport(format!("I/O error reading JSON: {value}"))),
            Category::Syntax | Category::Data | Category::Eof => {
                InfraError(BqError::MalformedResponse(format!("unexpected payload: {value}")))
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → BqError */
/* -------------------------------------------------------------------------- */

impl From<io::Error> for InfraError {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::NotFound => InfraError(BqError::Config(format!("file not found: {value}"))),
            io::ErrorKind::PermissionDenied => {
                InfraError(BqError::Config(format!("permission denied: {value}")))
            }
            _ => InfraError(BqError::Internal(format!("I/O failure: {value}"))),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
