//! Port interface for the HTTP exchange
//!
//! The transport performs exactly one request/response exchange. It does not
//! retry, attach credentials or interpret error bodies; those concerns
//! belong to the request executor.

use std::fmt;

use async_trait::async_trait;
use bqstream_domain::constants::AUTHORIZATION_HEADER;
use bqstream_domain::{BqError, ErrorDetail, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Opaque operation descriptor handed to the transport
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace any existing Authorization header with a bearer credential.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        self.headers.push((AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}")));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

// Headers carry the bearer token; keep them out of logs.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers.len())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Status and decoded JSON body of one exchange.
///
/// An empty body decodes to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Surface a service-reported error, or hand back the body.
    ///
    /// A body with an `error` member fails even under a 2xx status. A
    /// non-2xx status without one fails with the status as code.
    ///
    /// # Errors
    /// Returns `BqError::Api` carrying the remote code and sub-errors.
    pub fn into_result(self) -> Result<Value> {
        if self.body.get("error").is_some_and(Value::is_object) {
            if let Ok(envelope) = serde_json::from_value::<ErrorEnvelope>(self.body.clone()) {
                let ServiceError { code, message, errors } = envelope.error;
                return Err(BqError::Api {
                    code: code.unwrap_or(self.status),
                    message: message.unwrap_or_else(|| format!("status {}", self.status)),
                    errors,
                });
            }
        }

        if !self.is_success() {
            let message = match &self.body {
                Value::Null => format!("status {}", self.status),
                Value::String(text) if !text.is_empty() => text.clone(),
                other => other.to_string(),
            };
            return Err(BqError::api(self.status, message));
        }

        Ok(self.body)
    }
}

/// Trait for performing a single HTTP exchange
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the raw status and JSON body.
    ///
    /// Non-2xx statuses are not errors at this level; only failures to
    /// complete the exchange are.
    async fn exchange(&self, request: &HttpRequest) -> Result<RawResponse>;
}
