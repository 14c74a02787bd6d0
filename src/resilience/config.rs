//! # Resilience Configuration
//!
//! Runtime (`Duration`-typed) settings for circuit breakers and retries,
//! derived from the serializable [`ClientConfig`](crate::config::ClientConfig).

use std::time::Duration;

use crate::config::ClientConfig;
use crate::constants::defaults;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive transient failures before opening the circuit
    pub failure_threshold: u32,

    /// Time to stay open before allowing a trial call
    pub cooldown: Duration,
}

/// Retry and per-attempt deadline settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Deadline applied to each individual attempt
    pub attempt_timeout: Duration,
}

impl CircuitBreakerConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            failure_threshold: config.resilience.circuit_failure_threshold,
            cooldown: config.resilience.circuit_cooldown(),
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }

        if self.cooldown.is_zero() {
            return Err("cooldown must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::CIRCUIT_FAILURE_THRESHOLD,
            cooldown: Duration::from_millis(defaults::CIRCUIT_COOLDOWN_MS),
        }
    }
}

impl RetryConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.resilience.max_retry_attempts,
            base_backoff: config.resilience.base_backoff(),
            max_backoff: config.resilience.max_backoff(),
            attempt_timeout: config.timeout(),
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }

        if self.max_backoff < self.base_backoff {
            return Err("max_backoff must not be less than base_backoff".to_string());
        }

        if self.attempt_timeout.is_zero() {
            return Err("attempt_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_RETRY_ATTEMPTS,
            base_backoff: Duration::from_millis(defaults::BASE_BACKOFF_MS),
            max_backoff: Duration::from_millis(defaults::MAX_BACKOFF_MS),
            attempt_timeout: Duration::from_millis(defaults::TIMEOUT_MS),
        }
    }
}
