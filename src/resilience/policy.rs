//! # Resilience Policy
//!
//! Wraps an outbound call with a per-attempt deadline, bounded retry with
//! exponential backoff, and a circuit breaker.
//!
//! ```text
//! attempt ──► circuit permit? ──no──► TransportFailure(CircuitOpen)
//!                 │ yes
//!                 ▼
//!          call (with deadline) ──► outcome
//!                 │
//!     transient? record failure : record success
//!                 │
//!     retryable under mode and attempts left? ──yes──► sleep(backoff) ──► attempt
//!                 │ no
//!                 ▼
//!              outcome
//! ```
//!
//! Dropping the returned future aborts the in-flight attempt without counting
//! it against the circuit; only the policy's own deadline produces a
//! `Timeout` failure.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::classifier::{is_transient, is_transport_failure};
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryConfig};
use crate::transport::{CallOutcome, Method, TransportError};

/// Which failures a call may be retried on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Transport failures, 5xx and 429 (safe for reads)
    Transient,
    /// Only failures where no response was received (writes)
    TransportOnly,
}

impl RetryMode {
    /// Reads retry on any transient failure; writes only when nothing was received
    #[must_use]
    pub fn for_method(method: Method) -> Self {
        if method.is_idempotent_read() {
            RetryMode::Transient
        } else {
            RetryMode::TransportOnly
        }
    }
}

/// Per-invocation retry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub next_delay: std::time::Duration,
}

/// Retry, backoff and circuit breaking around a single endpoint
#[derive(Debug)]
pub struct ResiliencePolicy {
    retry: RetryConfig,
    circuit: Arc<CircuitBreaker>,
}

impl ResiliencePolicy {
    /// Create a policy with its own circuit
    pub fn new(endpoint: impl Into<String>, retry: RetryConfig, circuit: CircuitBreakerConfig) -> Self {
        Self {
            retry,
            circuit: Arc::new(CircuitBreaker::new(endpoint, circuit)),
        }
    }

    /// Create a policy sharing an existing circuit
    pub fn with_circuit(retry: RetryConfig, circuit: Arc<CircuitBreaker>) -> Self {
        Self { retry, circuit }
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker> {
        &self.circuit
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run `call` under the policy
    ///
    /// `call` receives the 1-based attempt number and is invoked at most
    /// `max_attempts` times. Non-transient outcomes are returned after the
    /// first attempt.
    pub async fn execute<F, Fut>(&self, mode: RetryMode, mut call: F) -> CallOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = CallOutcome>,
    {
        let mut state = RetryState {
            attempt: 0,
            next_delay: self.retry.base_backoff,
        };

        loop {
            state.attempt += 1;

            let permit = match self.circuit.try_acquire() {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(
                        endpoint = %self.circuit.name(),
                        attempt = state.attempt,
                        error = %e,
                        "Call rejected by open circuit"
                    );
                    return CallOutcome::TransportFailure(TransportError::CircuitOpen {
                        endpoint: self.circuit.name().to_string(),
                    });
                }
            };

            debug!(
                endpoint = %self.circuit.name(),
                attempt = state.attempt,
                max_attempts = self.retry.max_attempts,
                trial = permit.is_trial(),
                "Attempting call"
            );

            let outcome = match tokio::time::timeout(self.retry.attempt_timeout, call(state.attempt)).await
            {
                Ok(outcome) => outcome,
                Err(_) => CallOutcome::TransportFailure(TransportError::Timeout),
            };

            let transient = is_transient(&outcome);
            if transient {
                permit.record_failure();
            } else {
                permit.record_success();
            }

            if outcome.is_success() {
                return outcome;
            }

            let retryable = match mode {
                RetryMode::Transient => transient,
                RetryMode::TransportOnly => is_transport_failure(&outcome),
            };

            if !retryable {
                debug!(
                    endpoint = %self.circuit.name(),
                    attempt = state.attempt,
                    "Outcome not retryable under {:?}", mode
                );
                return outcome;
            }

            if state.attempt >= self.retry.max_attempts {
                error!(
                    endpoint = %self.circuit.name(),
                    attempts = state.attempt,
                    max_attempts = self.retry.max_attempts,
                    "Exhausted all retries"
                );
                return outcome;
            }

            state.next_delay =
                calculate_backoff(state.attempt, self.retry.base_backoff, self.retry.max_backoff);

            warn!(
                endpoint = %self.circuit.name(),
                attempt = state.attempt,
                max_attempts = self.retry.max_attempts,
                delay_ms = state.next_delay.as_millis() as u64,
                outcome = ?outcome,
                "Transient failure, will retry"
            );

            tokio::time::sleep(state.next_delay).await;
        }
    }
}
