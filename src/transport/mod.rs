//! # Transport Layer
//!
//! The outbound seam of the client. A [`Transport`] turns one [`OutboundRequest`]
//! into one [`CallOutcome`]; it never retries, caches, or classifies. Those
//! concerns belong to the resilience policy and the resource client.
//!
//! [`HttpTransport`] is the reqwest-backed implementation used in production.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method subset used by resource operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether repeating the request is free of side effects
    #[must_use]
    pub fn is_idempotent_read(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A fully-resolved request ready to hand to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the configured base URL, e.g. `/api/customers/42`
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Bearer token attached as `Authorization: Bearer <token>`
    pub bearer_token: Option<String>,
    /// Extra headers (idempotency key and similar)
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            bearer_token: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Why an attempt produced no HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure
    Connect(String),
    /// Attempt exceeded the policy or transport deadline
    Timeout,
    /// The circuit for this endpoint is open; no call was made
    CircuitOpen { endpoint: String },
    /// Any other failure before a status line was received
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connection failed: {msg}"),
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::CircuitOpen { endpoint } => {
                write!(f, "circuit open for endpoint {endpoint}")
            }
            TransportError::Other(msg) => write!(f, "transport failure: {msg}"),
        }
    }
}

/// Raw outcome of a single attempt, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// 2xx response; payload is the raw body text (may be empty)
    Success(String),
    TransportFailure(TransportError),
    StatusFailure { status: u16, body: String },
}

impl CallOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Convenience constructor used by transports and tests
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        CallOutcome::StatusFailure {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request and reports exactly what happened
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: &OutboundRequest) -> CallOutcome;
}
