//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CallOutcome, Method, OutboundRequest, Transport, TransportError};
use crate::config::ClientConfig;
use crate::error::ConfigResult;

/// HTTP transport over a shared reqwest connection pool
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport from client configuration
    ///
    /// Fails only on a malformed base URL or an unbuildable HTTP client.
    pub fn new(config: &ClientConfig) -> ConfigResult<Self> {
        let base_url = normalize_base_url(Url::parse(&config.base_url)?);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            "Created HTTP transport"
        );

        Ok(Self { client, base_url })
    }

    /// Base URL all request paths are resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, request: &OutboundRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::Other(format!("invalid request path: {e}")))?;

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

/// Keep any base path when joining relative request paths
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_send_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> CallOutcome {
        let url = match self.resolve(request) {
            Ok(url) => url,
            Err(e) => return CallOutcome::TransportFailure(e),
        };

        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url.clone());

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, url = %url, error = %e, "Request failed before a response");
                return CallOutcome::TransportFailure(map_send_error(&e));
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) if status.is_success() => CallOutcome::Success(body),
            Ok(body) => CallOutcome::StatusFailure {
                status: status.as_u16(),
                body,
            },
            Err(e) => {
                // A status line arrived, so the request reached the service.
                warn!(status = %status, error = %e, "Failed to read response body");
                CallOutcome::StatusFailure {
                    status: status.as_u16(),
                    body: String::new(),
                }
            }
        }
    }
}
