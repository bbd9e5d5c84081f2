use std::time::Duration;

use async_trait::async_trait;
use bqstream_core::{HttpMethod, HttpRequest, HttpTransport, RawResponse};
use bqstream_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use bqstream_domain::{BqError, Result};
use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;
use tracing::debug;

use crate::errors::to_bq;

/// reqwest-backed [`HttpTransport`].
///
/// Performs a single exchange per call. Retries are owned by the request
/// executor, never by the transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn exchange(&self, request: &HttpRequest) -> Result<RawResponse> {
        let mut builder = self.client.request(Self::method(request.method), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.url, "sending HTTP request");

        let response = builder.send().await.map_err(to_bq)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(to_bq)?;

        debug!(
            method = %request.method,
            url = %request.url,
            %status,
            bytes = bytes.len(),
            "received HTTP response"
        );

        Ok(RawResponse::new(status.as_u16(), decode_body(status.is_success(), &bytes)?))
    }
}

/// Empty bodies decode to `Null`; non-JSON error bodies are kept as text so
/// the status error carries something readable.
fn decode_body(success: bool, bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) if !success => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        Err(err) => Err(BqError::MalformedResponse(format!("response is not JSON: {err}"))),
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        builder = builder.user_agent(
            self.user_agent.unwrap_or_else(|| format!("bqstream/{}", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(to_bq)?;

        Ok(ReqwestTransport { client })
    }
}
