//! Construction of [`ResourceClient`] with optional injected collaborators.

use std::sync::Arc;
use tracing::info;

use super::ResourceClient;
use crate::auth::{self, Credential, CredentialManager, TokenProvider};
use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::error::{ConfigResult, ConfigurationError};
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerManager, RetryConfig};
use crate::transport::{HttpTransport, Transport};

/// Builder for [`ResourceClient`]
///
/// Anything not supplied is derived from the configuration: an
/// [`HttpTransport`] against `base_url`, a token provider chosen from the
/// `auth` section, and an empty cache.
#[derive(Debug)]
pub struct ResourceClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    credential: Option<Credential>,
    cache: Option<CacheStore>,
}

impl ResourceClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            token_provider: None,
            credential: None,
            cache: None,
        }
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Start with an already-issued credential
    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Share a cache with other clients
    #[must_use]
    pub fn cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> ConfigResult<ResourceClient> {
        self.config.validate()?;

        let retry = RetryConfig::from_client_config(&self.config);
        let circuit = CircuitBreakerConfig::from_client_config(&self.config);
        retry.validate().map_err(ConfigurationError::invalid)?;
        circuit.validate().map_err(ConfigurationError::invalid)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        let provider = match self.token_provider {
            Some(provider) => provider,
            None => auth::provider_from_config(&self.config.auth, self.config.timeout())?,
        };

        let credentials = CredentialManager::new(provider, self.config.auth.staleness_window());
        if let Some(credential) = self.credential {
            credentials.install(credential);
        }

        info!(
            base_url = %self.config.base_url,
            max_retry_attempts = retry.max_attempts,
            circuit_failure_threshold = circuit.failure_threshold,
            "✅ Resource client created"
        );

        Ok(ResourceClient {
            config: Arc::new(self.config),
            transport,
            credentials,
            cache: self.cache.unwrap_or_default(),
            circuits: Arc::new(CircuitBreakerManager::new(circuit)),
            retry,
        })
    }
}
