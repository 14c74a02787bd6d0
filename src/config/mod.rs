//! # Client Configuration
//!
//! Configuration for the resource client, its resilience policy, cache TTLs,
//! route templates and credential source.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use resource_client::config::ClientConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults, overridden by an optional config file and RESOURCE_CLIENT__* variables
//! let config = ClientConfig::load()?;
//! println!("Remote service: {}", config.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! Every field has a default so minimal files work. Durations are expressed in
//! milliseconds and exposed as [`Duration`] through accessor methods.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{defaults, operations};
use crate::error::{ConfigResult, ConfigurationError};

/// Root configuration for a [`ResourceClient`](crate::client::ResourceClient)
///
/// # Examples
///
/// ```rust
/// use resource_client::config::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// assert_eq!(config.resilience.max_retry_attempts, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the remote service (e.g., "<https://records.example.com>")
    pub base_url: String,
    /// Per-attempt deadline in milliseconds
    pub timeout_ms: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
    pub resilience: ResilienceConfig,
    pub cache: CacheConfig,
    pub routes: RouteConfig,
    pub auth: AuthConfig,
}

/// Retry, backoff and circuit breaker settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Total attempts per call, including the first
    pub max_retry_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive transient failures before the circuit opens
    pub circuit_failure_threshold: u32,
    /// Time the circuit stays open before allowing a trial call
    pub circuit_cooldown_ms: u64,
}

/// Cache TTLs for read operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_ms: u64,
    /// Keyed by `"{resource}:{operation}"` or by bare `"{operation}"`
    pub ttl_by_operation_ms: HashMap<String, u64>,
}

/// Route templates with `{resource}` and `{id}` placeholders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouteConfig {
    pub collection: String,
    pub item: String,
    pub health: String,
    /// Per-resource overrides of the collection/item templates
    pub overrides: HashMap<String, ResourceRoutes>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResourceRoutes {
    pub collection: Option<String>,
    pub item: Option<String>,
}

/// Client-side credential source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth2-style token endpoint; when set, tokens are renewed through it
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Fixed bearer token used when no token endpoint is configured
    pub static_token: Option<String>,
    /// Tokens expiring within this window are renewed before use
    pub staleness_window_ms: u64,
    /// Header carrying the per-write idempotency key; `None` disables it
    pub idempotency_header: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            timeout_ms: defaults::TIMEOUT_MS,
            user_agent: format!("resource-client/{}", env!("CARGO_PKG_VERSION")),
            resilience: ResilienceConfig::default(),
            cache: CacheConfig::default(),
            routes: RouteConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: defaults::MAX_RETRY_ATTEMPTS,
            base_backoff_ms: defaults::BASE_BACKOFF_MS,
            max_backoff_ms: defaults::MAX_BACKOFF_MS,
            circuit_failure_threshold: defaults::CIRCUIT_FAILURE_THRESHOLD,
            circuit_cooldown_ms: defaults::CIRCUIT_COOLDOWN_MS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let mut ttl_by_operation_ms = HashMap::new();
        ttl_by_operation_ms.insert(operations::LIST.to_string(), defaults::LIST_TTL_MS);
        ttl_by_operation_ms.insert(operations::GET.to_string(), defaults::GET_TTL_MS);
        Self {
            default_ttl_ms: defaults::CACHE_TTL_MS,
            ttl_by_operation_ms,
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            collection: defaults::COLLECTION_ROUTE.to_string(),
            item: defaults::ITEM_ROUTE.to_string(),
            health: defaults::HEALTH_ROUTE.to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            static_token: None,
            staleness_window_ms: defaults::STALENESS_WINDOW_MS,
            idempotency_header: Some(defaults::IDEMPOTENCY_HEADER.to_string()),
        }
    }
}

impl ClientConfig {
    /// Per-attempt deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate configuration, collecting every violation
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        match url::Url::parse(&self.base_url) {
            Ok(url) if url.cannot_be_a_base() => {
                errors.push(format!("base_url cannot be a base: {}", self.base_url));
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("base_url is invalid: {e}")),
        }

        if self.timeout_ms == 0 {
            errors.push("timeout_ms must be greater than 0".to_string());
        }

        errors.extend(self.resilience.violations());
        errors.extend(self.routes.violations());
        errors.extend(self.auth.violations());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::Validation(errors))
        }
    }
}

impl ResilienceConfig {
    #[must_use]
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    #[must_use]
    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_cooldown_ms)
    }

    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_retry_attempts == 0 {
            errors.push("resilience.max_retry_attempts must be at least 1".to_string());
        }
        if self.max_backoff_ms < self.base_backoff_ms {
            errors.push(
                "resilience.max_backoff_ms must not be less than base_backoff_ms".to_string(),
            );
        }
        if self.circuit_failure_threshold == 0 {
            errors.push("resilience.circuit_failure_threshold must be greater than 0".to_string());
        }
        if self.circuit_cooldown_ms == 0 {
            errors.push("resilience.circuit_cooldown_ms must be greater than 0".to_string());
        }
        errors
    }
}

impl CacheConfig {
    /// TTL for a read operation on a resource
    ///
    /// Lookup order: `"{resource}:{operation}"`, `"{operation}"`, default.
    #[must_use]
    pub fn ttl_for(&self, resource: &str, operation: &str) -> Duration {
        let ms = self
            .ttl_by_operation_ms
            .get(&format!("{resource}:{operation}"))
            .or_else(|| self.ttl_by_operation_ms.get(operation))
            .copied()
            .unwrap_or(self.default_ttl_ms);
        Duration::from_millis(ms)
    }
}

impl RouteConfig {
    /// Collection path for a resource, e.g. `/api/customers`
    #[must_use]
    pub fn collection_path(&self, resource: &str) -> String {
        let template = self
            .overrides
            .get(resource)
            .and_then(|o| o.collection.as_deref())
            .unwrap_or(&self.collection);
        template.replace("{resource}", resource)
    }

    /// Item path for a resource id, e.g. `/api/customers/42`
    #[must_use]
    pub fn item_path(&self, resource: &str, id: &str) -> String {
        let template = self
            .overrides
            .get(resource)
            .and_then(|o| o.item.as_deref())
            .unwrap_or(&self.item);
        template.replace("{resource}", resource).replace("{id}", id)
    }

    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.item.contains("{id}") {
            errors.push("routes.item must contain an {id} placeholder".to_string());
        }
        for (resource, routes) in &self.overrides {
            if let Some(item) = &routes.item {
                if !item.contains("{id}") {
                    errors.push(format!(
                        "routes.overrides.{resource}.item must contain an {{id}} placeholder"
                    ));
                }
            }
        }
        errors
    }
}

impl AuthConfig {
    #[must_use]
    pub fn staleness_window(&self) -> Duration {
        Duration::from_millis(self.staleness_window_ms)
    }

    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(token_url) = &self.token_url {
            if let Err(e) = url::Url::parse(token_url) {
                errors.push(format!("auth.token_url is invalid: {e}"));
            }
            if self.client_id.is_none() && self.refresh_token.is_none() {
                errors.push(
                    "auth.token_url requires client_id or refresh_token".to_string(),
                );
            }
        }
        if matches!(&self.idempotency_header, Some(h) if h.trim().is_empty()) {
            errors.push("auth.idempotency_header must not be empty".to_string());
        }
        errors
    }
}
