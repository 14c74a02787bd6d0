use async_trait::async_trait;
use resource_client::auth::{Credential, TokenProvider};
use resource_client::error::{AuthResult, AuthenticationError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Issues `token-1`, `token-2`, ... and counts renewals
#[derive(Debug, Default)]
pub struct CountingTokenProvider {
    calls: AtomicUsize,
    latency: Duration,
}

impl CountingTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            latency,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Credential::new(format!("token-{n}")))
    }
}

/// Refresh credential has been revoked
#[derive(Debug, Default)]
pub struct RevokedTokenProvider {
    calls: AtomicUsize,
}

impl RevokedTokenProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for RevokedTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthenticationError::Rejected("refresh token revoked".to_string()))
    }
}

/// Token endpoint is down
#[derive(Debug, Default)]
pub struct UnreachableTokenProvider {
    calls: AtomicUsize,
}

impl UnreachableTokenProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for UnreachableTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthenticationError::Unreachable("HTTP 503".to_string()))
    }
}
