//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured sub-error reported by the service.
///
/// Appears in `error.errors[]` of a failed response, in
/// `status.errorResult` of a failed job and in `insertErrors[].errors[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl ErrorDetail {
    /// Reason code the service uses for unknown jobs, tables and datasets.
    pub const NOT_FOUND_REASON: &'static str = "notFound";

    pub fn is_not_found(&self) -> bool {
        self.reason.as_deref() == Some(Self::NOT_FOUND_REASON)
    }
}

/// Coarse classification used by the retry and recovery logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401/403 - retried after the cached credential is dropped
    TransientAuth,
    /// 404 or a `notFound` sub-error - a provisioning or re-resolution signal
    NotFound,
    /// A query job finished with an error result
    JobFailed,
    /// Expected fields missing or misaligned - never retried
    MalformedResponse,
    /// Connection level failure - never retried by this layer
    Transport,
    /// Local misconfiguration or invalid caller input
    Config,
    /// Any other service or internal error
    Other,
}

/// Main error type for the client
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum BqError {
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String, errors: Vec<ErrorDetail> },

    #[error("Query job failed: {message}")]
    Job { message: String, errors: Vec<ErrorDetail> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BqError {
    /// Build an API error from a bare status code and message.
    pub fn api(code: u16, message: impl Into<String>) -> Self {
        Self::Api { code, message: message.into(), errors: Vec::new() }
    }

    /// Remote status code, if the service produced this error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Structured sub-errors carried by the error, if any
    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            Self::Api { errors, .. } | Self::Job { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn is_transient_auth(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { code, errors, .. } => {
                *code == 404 || errors.iter().any(ErrorDetail::is_not_found)
            }
            _ => false,
        }
    }

    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        if self.is_transient_auth() {
            return ErrorKind::TransientAuth;
        }
        if self.is_not_found() {
            return ErrorKind::NotFound;
        }
        match self {
            Self::Job { .. } => ErrorKind::JobFailed,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Config(_) | Self::InvalidInput(_) => ErrorKind::Config,
            Self::Api { .. } | Self::Auth(_) | Self::Internal(_) => ErrorKind::Other,
        }
    }

    /// Stable label suitable for structured logs
    pub fn label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::TransientAuth => "transient_auth",
            ErrorKind::NotFound => "not_found",
            ErrorKind::JobFailed => "job_failed",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Transport => "transport",
            ErrorKind::Config => "config",
            ErrorKind::Other => "other",
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, BqError>;
