//! Single-flight request gate
//!
//! Every exchange with the service goes through [`RequestGate::submit`]. At
//! most one exchange is in flight; later submissions wait in a FIFO backlog
//! and are dispatched strictly in arrival order by a drain task.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use bqstream_core::HttpRequest;
use bqstream_domain::{BqError, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::executor::RetryingExecutor;
use crate::errors::to_bq;

struct PendingCall {
    request: HttpRequest,
    slot: oneshot::Sender<Result<Value>>,
}

#[derive(Default)]
struct GateState {
    busy: bool,
    backlog: VecDeque<PendingCall>,
}

/// Serializes outbound calls into one ordered stream.
///
/// Cloning yields another handle to the same gate.
#[derive(Clone)]
pub struct RequestGate {
    executor: Arc<RetryingExecutor>,
    state: Arc<Mutex<GateState>>,
}

impl RequestGate {
    /// Create an idle gate that dispatches through `executor`.
    pub fn new(executor: RetryingExecutor) -> Self {
        Self { executor: Arc::new(executor), state: Arc::new(Mutex::new(GateState::default())) }
    }

    /// Queue `request` and return a future for its outcome.
    ///
    /// The call is enqueued before this function returns, so submission
    /// order is the order of `submit` calls, not of awaiting. Once queued, a
    /// call runs to completion even if the returned future is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: HttpRequest) -> impl Future<Output = Result<Value>> + Send + 'static {
        let (slot, outcome) = oneshot::channel();

        let start_drain = {
            let mut state = self.state.lock();
            state.backlog.push_back(PendingCall { request, slot });
            trace!(pending = state.backlog.len(), busy = state.busy, "request queued");
            !std::mem::replace(&mut state.busy, true)
        };

        if start_drain {
            tokio::spawn(drain(self.executor.clone(), self.state.clone()));
        }

        async move {
            outcome
                .await
                .map_err(|_| BqError::Internal("request gate dropped a pending call".into()))?
        }
    }

    /// Submit and deserialize the success body.
    ///
    /// An empty body is read as `{}`.
    pub async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let body = match self.submit(request).await? {
            Value::Null => Value::Object(serde_json::Map::new()),
            body => body,
        };
        serde_json::from_value(body).map_err(to_bq)
    }

    /// GET `url` through the gate and decode the response.
    pub async fn get_json<T: DeserializeOwned>(&self, url: impl Into<String>) -> Result<T> {
        self.call(HttpRequest::get(url)).await
    }

    /// POST `body` as JSON to `url` through the gate and decode the response.
    pub async fn post_json<B, T>(&self, url: impl Into<String>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(to_bq)?;
        self.call(HttpRequest::post(url, body)).await
    }

    /// Calls waiting behind the in-flight one
    pub fn pending(&self) -> usize {
        self.state.lock().backlog.len()
    }

    /// Whether an exchange is in flight.
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }
}

/// Dispatch queued calls one at a time until the backlog is empty.
///
/// The gate flips back to idle under the same lock that observes the empty
/// backlog, so a concurrent `submit` either lands in this loop or starts a
/// new one.
async fn drain(executor: Arc<RetryingExecutor>, state: Arc<Mutex<GateState>>) {
    loop {
        let call = {
            let mut state = state.lock();
            match state.backlog.pop_front() {
                Some(call) => call,
                None => {
                    state.busy = false;
                    trace!("request gate idle");
                    return;
                }
            }
        };

        debug!(method = %call.request.method, url = %call.request.url, "dispatching request");
        let outcome = executor.execute(&call.request).await;
        // The caller may have stopped listening; the call still counted.
        let _ = call.slot.send(outcome);
    }
}
