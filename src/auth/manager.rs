//! # Credential Manager
//!
//! Owns the current credential and collapses concurrent renewals into a single
//! call to the [`TokenProvider`]. The published credential sits behind an
//! `RwLock` and is replaced in one write; the in-flight renewal is a
//! [`Shared`] future every concurrent caller awaits.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Credential, TokenProvider};
use crate::error::{AuthResult, AuthenticationError};

type Renewal = Shared<BoxFuture<'static, AuthResult<Credential>>>;

struct CredentialState {
    current: RwLock<Option<Credential>>,
    inflight: Mutex<Option<(u64, Renewal)>>,
    generation: AtomicU64,
    provider: Arc<dyn TokenProvider>,
    staleness_window: Duration,
    renewals: AtomicU64,
}

impl std::fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialState")
            .field("current", &*self.current.read())
            .field("renewal_in_flight", &self.inflight.lock().is_some())
            .field("provider", &self.provider)
            .field("staleness_window", &self.staleness_window)
            .finish()
    }
}

/// Cheaply cloneable handle to one credential lifecycle
#[derive(Debug, Clone)]
pub struct CredentialManager {
    state: Arc<CredentialState>,
}

impl CredentialManager {
    pub fn new(provider: Arc<dyn TokenProvider>, staleness_window: Duration) -> Self {
        Self {
            state: Arc::new(CredentialState {
                current: RwLock::new(None),
                inflight: Mutex::new(None),
                generation: AtomicU64::new(0),
                provider,
                staleness_window,
                renewals: AtomicU64::new(0),
            }),
        }
    }

    /// Seed with a credential obtained elsewhere (e.g. an interactive login)
    #[must_use]
    pub fn with_credential(self, credential: Credential) -> Self {
        self.install(credential);
        self
    }

    /// Current token, renewing first if missing or inside the staleness window
    pub async fn get_token(&self) -> AuthResult<String> {
        if let Some(credential) = self.current() {
            if !credential.is_stale(self.state.staleness_window) {
                return Ok(credential.token);
            }
            debug!(expires_at = ?credential.expires_at, "Credential within staleness window");
        }

        self.refresh().await.map(|credential| credential.token)
    }

    /// Renew the credential
    ///
    /// Callers arriving while a renewal is in flight join it and receive the
    /// same result; the provider is called once.
    pub async fn refresh(&self) -> AuthResult<Credential> {
        let renewal = {
            let mut inflight = self.state.inflight.lock();
            match inflight.as_ref() {
                Some((_, renewal)) => renewal.clone(),
                None => {
                    let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let renewal = renew(Arc::clone(&self.state), generation).boxed().shared();
                    *inflight = Some((generation, renewal.clone()));
                    renewal
                }
            }
        };

        renewal.await
    }

    /// Renew only if `rejected` is still the current token
    ///
    /// When several calls are rejected with the same token, the first renews
    /// and the rest pick up its result instead of renewing again.
    pub async fn refresh_rejected(&self, rejected: &str) -> AuthResult<Credential> {
        if let Some(current) = self.current() {
            if current.token != rejected {
                debug!("Credential already renewed by a concurrent caller");
                return Ok(current);
            }
        }
        self.refresh().await
    }

    /// Whether a usable credential is held; never renews
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state
            .current
            .read()
            .as_ref()
            .is_some_and(Credential::is_valid)
    }

    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        self.state.current.read().clone()
    }

    pub fn install(&self, credential: Credential) {
        info!(expires_at = ?credential.expires_at, "Installing access credential");
        *self.state.current.write() = Some(credential);
    }

    /// Forget the current credential (sign-out)
    pub fn clear(&self) {
        info!("Clearing access credential");
        *self.state.current.write() = None;
    }

    /// Number of renewals that reached the provider
    #[must_use]
    pub fn renewal_count(&self) -> u64 {
        self.state.renewals.load(Ordering::SeqCst)
    }
}

async fn renew(state: Arc<CredentialState>, generation: u64) -> AuthResult<Credential> {
    state.renewals.fetch_add(1, Ordering::SeqCst);
    warn!(generation, "Renewing access credential");

    let result = state.provider.fetch_token().await;

    match &result {
        Ok(credential) => {
            *state.current.write() = Some(credential.clone());
            info!(generation, expires_at = ?credential.expires_at, "Access credential renewed");
        }
        Err(AuthenticationError::Rejected(reason)) => {
            // The session cannot be renewed; stop presenting the old token as valid
            *state.current.write() = None;
            warn!(generation, reason = %reason, "Credential renewal rejected");
        }
        Err(e) => {
            warn!(generation, error = %e, "Credential renewal failed");
        }
    }

    let mut inflight = state.inflight.lock();
    if matches!(inflight.as_ref(), Some((current, _)) if *current == generation) {
        *inflight = None;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    /// Issues `token-1`, `token-2`, ... after a short delay
    #[derive(Debug, Default)]
    struct SlowProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for SlowProvider {
        async fn fetch_token(&self) -> AuthResult<Credential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Credential::new(format!("token-{n}")))
        }
    }

    #[derive(Debug)]
    struct RejectingProvider;

    #[async_trait]
    impl TokenProvider for RejectingProvider {
        async fn fetch_token(&self) -> AuthResult<Credential> {
            Err(AuthenticationError::Rejected("refresh token revoked".into()))
        }
    }

    fn manager_with(provider: Arc<dyn TokenProvider>) -> CredentialManager {
        CredentialManager::new(provider, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_get_token_fetches_when_missing() {
        let manager = manager_with(Arc::new(StaticTokenProvider::new("abc")));
        assert!(!manager.is_authenticated());

        assert_eq!(manager.get_token().await.unwrap(), "abc");
        assert!(manager.is_authenticated());
        assert_eq!(manager.renewal_count(), 1);

        // Unknown expiry is never stale
        manager.get_token().await.unwrap();
        assert_eq!(manager.renewal_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_credential_is_renewed() {
        let manager = manager_with(Arc::new(StaticTokenProvider::new("fresh")))
            .with_credential(Credential::expiring_in("old", Duration::from_secs(10)));

        assert!(manager.is_authenticated());
        assert_eq!(manager.get_token().await.unwrap(), "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_collapse() {
        let provider = Arc::new(SlowProvider::default());
        let manager = manager_with(provider.clone());

        let results = futures::future::join_all((0..10).map(|_| manager.refresh())).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().token, "token-1");
        }

        // A later refresh is a new renewal
        assert_eq!(manager.refresh().await.unwrap().token, "token-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_rejected_skips_already_renewed_token() {
        let provider = Arc::new(SlowProvider::default());
        let manager = manager_with(provider.clone());

        let first = manager.get_token().await.unwrap();
        let renewed = manager.refresh_rejected(&first).await.unwrap();
        assert_eq!(renewed.token, "token-2");

        // A straggler rejected with the old token reuses the new one
        let reused = manager.refresh_rejected(&first).await.unwrap();
        assert_eq!(reused.token, "token-2");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_renewal_clears_session() {
        let manager = manager_with(Arc::new(RejectingProvider))
            .with_credential(Credential::new("old"));
        assert!(manager.is_authenticated());

        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(err, AuthenticationError::Rejected(_)));
        assert!(!manager.is_authenticated());
        assert!(manager.current().is_none());
    }

    #[tokio::test]
    async fn test_is_authenticated_is_pure() {
        let manager = manager_with(Arc::new(StaticTokenProvider::new("abc"))).with_credential(
            Credential::expiring_at("expired", Utc::now() - chrono::Duration::seconds(1)),
        );

        assert!(!manager.is_authenticated());
        assert_eq!(manager.renewal_count(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let manager =
            manager_with(Arc::new(StaticTokenProvider::new("abc"))).with_credential(Credential::new("x"));
        manager.clear();
        assert!(!manager.is_authenticated());
    }
}
