//! # Resource Client
//!
//! The orchestrator: composes the cache, credential manager, resilience
//! policy and error classifier into logical operations on remote resources.
//!
//! ## Reads
//!
//! ```text
//! fetch ──► cache hit? ──yes──► decode ──► caller
//!              │ no
//!              ▼
//!        token ──► policy(Transient) ──► classify
//!                        │
//!          401? ──► refresh once ──► replay once
//!                        │
//!          success ──► decode ──► cache.set(ttl) ──► caller
//! ```
//!
//! ## Writes
//!
//! Never served from cache. Retried only on transport failures where no
//! response was received, carry one idempotency key across every attempt
//! and the replay, and invalidate the resource's cached listings (and the
//! affected record) on success.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use resource_client::{ClientConfig, ListQuery, ResourceClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ResourceClient::new(ClientConfig::load()?)?;
//!
//! let page = client.list("customers", &ListQuery::new().page(1).page_size(20)).await?;
//! for customer in &page.items {
//!     println!("{:?}", customer.id);
//! }
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::ResourceClientBuilder;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::CredentialManager;
use crate::cache::{key, CacheStats, CacheStore};
use crate::classifier::classify;
use crate::config::ClientConfig;
use crate::constants::operations;
use crate::error::{AuthenticationError, ClassifiedError, ClientResult, ConfigResult};
use crate::logging::{log_error, log_remote_operation};
use crate::models::{DomainRecord, ListQuery, MutationKind, QueryParams, RecordPage};
use crate::resilience::{
    CircuitBreakerManager, ResiliencePolicy, RetryConfig, RetryMode, SystemCircuitBreakerMetrics,
};
use crate::transport::{CallOutcome, Method, OutboundRequest, Transport};

/// Circuit name for the health route, kept apart from resource circuits
const HEALTH_CIRCUIT: &str = "__health";

/// Resilient, caching client for a remote resource service
///
/// Cloning is cheap; clones share the cache, credential and circuits.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    credentials: CredentialManager,
    cache: CacheStore,
    circuits: Arc<CircuitBreakerManager>,
    retry: RetryConfig,
}

impl ResourceClient {
    /// Create a client talking HTTP to `config.base_url`
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ResourceClientBuilder {
        ResourceClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn circuit_metrics(&self) -> SystemCircuitBreakerMetrics {
        self.circuits.get_system_metrics()
    }

    pub fn circuits(&self) -> &CircuitBreakerManager {
        &self.circuits
    }

    /// Cache-aside read of a collection (`id == None`) or a single record
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: Option<&str>,
        query: &QueryParams,
    ) -> ClientResult<T> {
        let (cache_key, operation, path) = match id {
            Some(id) => (
                key::item_query_key(resource, id, query),
                operations::GET,
                self.config.routes.item_path(resource, id),
            ),
            None => (
                key::list_key(resource, query),
                operations::LIST,
                self.config.routes.collection_path(resource),
            ),
        };

        if let Some(payload) = self.cache.get(&cache_key) {
            debug!(resource = resource, key = %cache_key, "Serving read from cache");
            return decode(&payload);
        }

        let request = OutboundRequest::new(Method::Get, path).with_query(query.clone());
        let payload = self
            .send_authorized(resource, operation, id, request)
            .await?;

        // Decode first so a malformed payload is never cached
        let value = decode(&payload)?;
        self.cache.set(
            &cache_key,
            payload,
            self.config.cache.ttl_for(resource, operation),
        );
        Ok(value)
    }

    /// Write to a resource and invalidate what it makes stale
    pub async fn mutate(
        &self,
        kind: MutationKind,
        resource: &str,
        id: Option<&str>,
        body: Option<Value>,
    ) -> ClientResult<DomainRecord> {
        let (method, path) = match (kind, id) {
            (MutationKind::Create, _) => (Method::Post, self.config.routes.collection_path(resource)),
            (MutationKind::Update, Some(id)) => (Method::Put, self.config.routes.item_path(resource, id)),
            (MutationKind::Delete, Some(id)) => {
                (Method::Delete, self.config.routes.item_path(resource, id))
            }
            (_, None) => {
                return Err(ClassifiedError::InvalidInput(format!(
                    "{kind} on {resource} requires a record id"
                )))
            }
        };

        let mut request = OutboundRequest::new(method, path);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        if let Some(header) = &self.config.auth.idempotency_header {
            request = request.with_header(header.clone(), Uuid::new_v4().to_string());
        }

        let payload = self
            .send_authorized(resource, kind.operation(), id, request)
            .await?;

        self.invalidate_after_write(resource, id);

        if payload.trim().is_empty() {
            return Ok(DomainRecord {
                id: id.map(str::to_string),
                ..Default::default()
            });
        }

        let mut record: DomainRecord = decode(&payload)?;
        if record.id.is_none() {
            record.id = id.map(str::to_string);
        }
        Ok(record)
    }

    /// List a collection
    ///
    /// Accepts either a bare JSON array or a page object with `items`.
    pub async fn list(&self, resource: &str, query: &ListQuery) -> ClientResult<RecordPage> {
        let value: Value = self.fetch(resource, None, &query.to_params()).await?;
        match value {
            Value::Array(items) => {
                let items = serde_json::from_value(Value::Array(items)).map_err(malformed)?;
                Ok(RecordPage {
                    items,
                    page: query.page,
                    page_size: query.page_size,
                    total_count: None,
                })
            }
            other => serde_json::from_value(other).map_err(malformed),
        }
    }

    pub async fn get(&self, resource: &str, id: &str) -> ClientResult<DomainRecord> {
        self.fetch(resource, Some(id), &QueryParams::new()).await
    }

    pub async fn create(&self, resource: &str, record: &DomainRecord) -> ClientResult<DomainRecord> {
        let body = to_body(record)?;
        self.mutate(MutationKind::Create, resource, None, Some(body)).await
    }

    pub async fn update(
        &self,
        resource: &str,
        id: &str,
        record: &DomainRecord,
    ) -> ClientResult<DomainRecord> {
        let body = to_body(record)?;
        self.mutate(MutationKind::Update, resource, Some(id), Some(body)).await
    }

    pub async fn delete(&self, resource: &str, id: &str) -> ClientResult<DomainRecord> {
        self.mutate(MutationKind::Delete, resource, Some(id), None).await
    }

    /// Probe the service's health route
    ///
    /// Unauthenticated, uncached, and guarded by its own circuit.
    pub async fn health_check(&self) -> ClientResult<()> {
        let request = OutboundRequest::new(Method::Get, self.config.routes.health.clone());
        let outcome = self
            .execute(HEALTH_CIRCUIT, &request, None)
            .await;
        match classify(&outcome) {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Drop every cached read of a resource
    pub fn invalidate_resource(&self, resource: &str) -> u64 {
        let removed = self.cache.remove_by_pattern(&key::resource_pattern(resource));
        debug!(resource = resource, removed = removed, "Invalidated resource cache");
        removed
    }

    fn invalidate_after_write(&self, resource: &str, id: Option<&str>) {
        let mut removed = self.cache.remove_by_pattern(&key::list_pattern(resource));
        if let Some(id) = id {
            let item = key::item_key(resource, id);
            self.cache.remove(&item);
            removed += self.cache.remove_by_pattern(&format!("{item}:*"));
        }
        debug!(resource = resource, record_id = id, removed = removed, "Invalidated stale reads");
    }

    /// Authorized call with the one-shot refresh-and-replay rule
    async fn send_authorized(
        &self,
        resource: &str,
        operation: &str,
        id: Option<&str>,
        request: OutboundRequest,
    ) -> ClientResult<String> {
        let started = Instant::now();
        let token = self.bearer_token().await?;

        let mut outcome = self.execute(resource, &request, token.as_deref()).await;

        if matches!(classify(&outcome), Some(ClassifiedError::Unauthorized)) {
            warn!(
                resource = resource,
                operation = operation,
                "Credential rejected, refreshing and replaying once"
            );
            let renewed = match token.as_deref() {
                Some(rejected) => self.credentials.refresh_rejected(rejected).await,
                None => self.credentials.refresh().await,
            };
            let renewed = match renewed {
                Ok(credential) => credential,
                Err(e) => {
                    log_error("resource_client", operation, &e.to_string(), Some(resource));
                    return Err(e.into());
                }
            };
            outcome = self
                .execute(resource, &request, Some(&renewed.token))
                .await;
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).ok();
        match outcome {
            CallOutcome::Success(payload) => {
                log_remote_operation(operation, resource, id, "success", duration_ms, None);
                Ok(payload)
            }
            failed => {
                let error = classify(&failed).unwrap_or_else(|| {
                    ClassifiedError::Unknown("unclassified outcome".to_string())
                });
                log_remote_operation(
                    operation,
                    resource,
                    id,
                    error.kind(),
                    duration_ms,
                    Some(&error.to_string()),
                );
                if matches!(error, ClassifiedError::ServerFault | ClassifiedError::Unknown(_)) {
                    log_error("resource_client", operation, &error.to_string(), Some(resource));
                }
                Err(error)
            }
        }
    }

    /// Current token, or none when no credential source is configured
    async fn bearer_token(&self) -> ClientResult<Option<String>> {
        match self.credentials.get_token().await {
            Ok(token) => Ok(Some(token)),
            Err(AuthenticationError::NotConfigured) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Could not obtain access token");
                Err(e.into())
            }
        }
    }

    /// One pass through the endpoint's resilience policy
    async fn execute(
        &self,
        endpoint: &str,
        request: &OutboundRequest,
        token: Option<&str>,
    ) -> CallOutcome {
        let policy = ResiliencePolicy::with_circuit(
            self.retry.clone(),
            self.circuits.get_circuit_breaker(endpoint),
        );

        let mode = RetryMode::for_method(request.method);
        let request = match token {
            Some(token) => request.clone().with_bearer_token(token),
            None => request.clone(),
        };
        let request = &request;
        let transport = &*self.transport;

        policy
            .execute(mode, move |_attempt| transport.send(request))
            .await
    }
}

fn decode<T: DeserializeOwned>(payload: &str) -> ClientResult<T> {
    serde_json::from_str(payload).map_err(malformed)
}

fn malformed(error: serde_json::Error) -> ClassifiedError {
    ClassifiedError::Unknown(format!("Malformed response body: {error}"))
}

fn to_body(record: &DomainRecord) -> ClientResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| ClassifiedError::InvalidInput(format!("Unserializable record: {e}")))
}
