//! In-memory fakes shared by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bqstream_core::{
    AuthRetryPolicy, HttpRequest, HttpTransport, KeyProvider, RawResponse, ServiceKey,
    TokenMinter,
};
use bqstream_domain::{BqError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::auth::{CredentialCache, InlineKeyProvider};
use crate::endpoints::Endpoints;
use crate::request::{RequestGate, RetryingExecutor};

pub(crate) const BASE: &str = "https://bq.test/v2";

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_latency(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    pub(crate) fn push(&self, response: Result<RawResponse>) -> &Self {
        self.script.lock().push_back(response);
        self
    }

    pub(crate) fn ok(&self, body: Value) -> &Self {
        self.push(Ok(RawResponse::ok(body)))
    }

    pub(crate) fn status(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(RawResponse::new(status, body)))
    }

    /// Queue a service error envelope with a single sub-error.
    pub(crate) fn error(&self, code: u16, reason: &str) -> &Self {
        self.status(
            code,
            json!({"error": {
                "code": code,
                "message": format!("{reason} error"),
                "errors": [{"reason": reason, "message": format!("{reason} error")}]
            }}),
        )
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn exchange(&self, request: &HttpRequest) -> Result<RawResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| {
            Err(BqError::Internal(format!("script exhausted at {} {}", request.method, request.url)))
        })
    }
}

/// Mints `token-1`, `token-2`, ... and counts calls.
#[derive(Default)]
pub(crate) struct CountingMinter {
    mints: AtomicUsize,
    delay: Duration,
}

impl CountingMinter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    pub(crate) fn mints(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMinter for CountingMinter {
    async fn mint(&self, _key: &ServiceKey, _issuer: &str, _scope: &str) -> Result<String> {
        let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("token-{n}"))
    }
}

#[derive(Default)]
pub(crate) struct CountingKeyProvider {
    loads: AtomicUsize,
}

impl CountingKeyProvider {
    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyProvider for CountingKeyProvider {
    async fn load_key(&self) -> Result<ServiceKey> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(ServiceKey::new("key"))
    }
}

/// Everything a component under test needs, wired to a scripted transport.
pub(crate) struct Harness {
    pub(crate) transport: Arc<ScriptedTransport>,
    pub(crate) minter: Arc<CountingMinter>,
    pub(crate) credentials: Arc<CredentialCache>,
    pub(crate) gate: RequestGate,
    pub(crate) endpoints: Endpoints,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_transport(ScriptedTransport::new())
    }

    pub(crate) fn with_transport(transport: ScriptedTransport) -> Self {
        Self::with_policy(transport, AuthRetryPolicy::default())
    }

    pub(crate) fn with_policy(transport: ScriptedTransport, policy: AuthRetryPolicy) -> Self {
        let transport = Arc::new(transport);
        let minter = Arc::new(CountingMinter::new());
        let credentials = Arc::new(CredentialCache::new(
            Arc::new(InlineKeyProvider::new("key")),
            minter.clone(),
            "svc@proj.iam",
            "scope",
            Duration::from_secs(300),
        ));
        let executor = RetryingExecutor::new(transport.clone(), credentials.clone(), policy);

        Self {
            transport,
            minter,
            credentials,
            gate: RequestGate::new(executor),
            endpoints: Endpoints::new(BASE, "proj"),
        }
    }
}
