use async_trait::async_trait;
use parking_lot::Mutex;
use resource_client::transport::{CallOutcome, OutboundRequest, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn Fn(&OutboundRequest) -> CallOutcome + Send + Sync>;

/// Transport double that answers from a script and records every request
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<CallOutcome>>,
    responder: Option<Responder>,
    latency: Option<Duration>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("remaining", &self.queue.lock().len())
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}

impl ScriptedTransport {
    /// Answer with `outcomes` in order; a 500 once they run out
    pub fn sequence(outcomes: Vec<CallOutcome>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(outcomes.into()),
            responder: None,
            latency: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request through `responder`
    pub fn from_fn<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&OutboundRequest) -> CallOutcome + Send + Sync + 'static,
    {
        Self::from_fn_with_latency(Duration::ZERO, responder)
    }

    /// Like [`from_fn`](Self::from_fn), sleeping before each answer
    pub fn from_fn_with_latency<F>(latency: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&OutboundRequest) -> CallOutcome + Send + Sync + 'static,
    {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            latency: (!latency.is_zero()).then_some(latency),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.path.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &OutboundRequest) -> CallOutcome {
        self.requests.lock().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(responder) = &self.responder {
            return responder(request);
        }

        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| CallOutcome::status(500, "script exhausted"))
    }
}

pub fn ok(body: &str) -> CallOutcome {
    CallOutcome::Success(body.to_string())
}

pub fn status(code: u16, body: &str) -> CallOutcome {
    CallOutcome::status(code, body)
}

pub fn refused() -> CallOutcome {
    CallOutcome::TransportFailure(TransportError::Connect("connection refused".to_string()))
}

/// 401 unless the request carries `accepted` as its bearer token
pub fn require_token(
    accepted: &'static str,
    body: &'static str,
) -> impl Fn(&OutboundRequest) -> CallOutcome + Send + Sync + 'static {
    move |request: &OutboundRequest| match request.bearer_token.as_deref() {
        Some(token) if token == accepted => ok(body),
        _ => status(401, r#"{"error":"invalid_token"}"#),
    }
}
