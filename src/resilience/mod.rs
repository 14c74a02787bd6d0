//! # Resilience Module
//!
//! Fault tolerance for outbound calls: bounded retry with exponential backoff
//! and per-endpoint circuit breakers that fail fast while a remote endpoint is
//! unhealthy.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: Closed / Open / Half-Open state per endpoint
//! - **Retry Policy**: Exponential backoff with jitter, transient failures only
//! - **Metrics Collection**: Failure rates and state transitions
//! - **Manager**: One circuit per endpoint, created on first use
//!
//! ## Usage
//!
//! ```rust
//! use resource_client::resilience::{ResiliencePolicy, RetryConfig, CircuitBreakerConfig, RetryMode};
//! use resource_client::transport::CallOutcome;
//!
//! # tokio_test::block_on(async {
//! let policy = ResiliencePolicy::new(
//!     "customers",
//!     RetryConfig::default(),
//!     CircuitBreakerConfig::default(),
//! );
//!
//! let outcome = policy
//!     .execute(RetryMode::Transient, |_attempt| async {
//!         CallOutcome::Success("[]".to_string())
//!     })
//!     .await;
//! assert!(outcome.is_success());
//! # });
//! ```

pub mod backoff;
pub mod circuit_breaker;
pub mod config;
pub mod manager;
pub mod metrics;
pub mod policy;

pub use backoff::calculate_backoff;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitPermit, CircuitState};
pub use self::config::{CircuitBreakerConfig, RetryConfig};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use policy::{ResiliencePolicy, RetryMode, RetryState};
