//! # Circuit Breaker Implementation
//!
//! Classic three-state breaker: Closed (normal operation), Open (failing fast)
//! and Half-Open (one trial call testing recovery).
//!
//! All state lives behind a single mutex per circuit, so counting failures
//! and transitioning are atomic with respect to concurrent callers.
//!
//! Callers obtain a [`CircuitPermit`] before each attempt and settle it with
//! the attempt's verdict. A permit dropped without a verdict (the caller
//! abandoned the attempt) counts as neither success nor failure; a dropped
//! half-open trial frees the trial slot for the next caller.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single trial call is allowed
    HalfOpen,
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitBreakerError {
    /// Circuit is open (or its half-open trial is taken), rejecting calls
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    total_calls: u64,
    success_count: u64,
    failure_count: u64,
    rejected_count: u64,
    times_opened: u64,
}

impl CircuitInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            rejected_count: 0,
            times_opened: 0,
        }
    }
}

/// Core circuit breaker with mutex-guarded state
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Endpoint name for logging and metrics
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

/// Permission to make one attempt through the circuit
#[derive(Debug)]
#[must_use = "a permit must be settled with record_success or record_failure"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            cooldown_ms = config.cooldown.as_millis() as u64,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(CircuitInner::new()),
        }
    }

    /// Get current circuit state
    ///
    /// An open circuit whose cool-down has elapsed still reports `Open` until
    /// the next caller claims the half-open trial.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask permission for one attempt
    pub fn try_acquire(&self) -> Result<CircuitPermit<'_>, CircuitBreakerError> {
        let mut inner = self.inner.lock();

        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map_or(true, |opened| opened.elapsed() >= self.config.cooldown);
                if !cooled_down {
                    inner.rejected_count += 1;
                    return Err(self.open_error());
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                info!(component = %self.name, "🟡 Circuit breaker half-open (testing recovery)");
                true
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    inner.rejected_count += 1;
                    return Err(self.open_error());
                }
                inner.trial_in_flight = true;
                true
            }
        };

        Ok(CircuitPermit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    fn open_error(&self) -> CircuitBreakerError {
        CircuitBreakerError::CircuitOpen {
            component: self.name.clone(),
        }
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        inner.success_count += 1;

        match inner.state {
            CircuitState::HalfOpen if trial => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
                info!(
                    component = %self.name,
                    total_calls = inner.total_calls,
                    "🟢 Circuit breaker closed (recovered)"
                );
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            // Stragglers admitted before the circuit opened do not move state
            CircuitState::HalfOpen | CircuitState::Open => {
                debug!(component = %self.name, "Late success recorded while circuit not closed");
            }
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        inner.failure_count += 1;

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.open(&mut inner);
                }
            }
            CircuitState::HalfOpen if trial => {
                inner.trial_in_flight = false;
                self.open(&mut inner);
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                debug!(component = %self.name, "Late failure recorded while circuit not closed");
            }
        }
    }

    fn on_abandoned(&self, trial: bool) {
        if !trial {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
            debug!(component = %self.name, "Half-open trial abandoned by caller");
        }
    }

    fn open(&self, inner: &mut CircuitInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.times_opened += 1;

        error!(
            component = %self.name,
            consecutive_failures = inner.consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            cooldown_ms = self.config.cooldown.as_millis() as u64,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        let mut inner = self.inner.lock();
        inner.trial_in_flight = false;
        self.open(&mut inner);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        let failure_rate = if inner.total_calls > 0 {
            inner.failure_count as f64 / inner.total_calls as f64
        } else {
            0.0
        };

        CircuitBreakerMetrics {
            total_calls: inner.total_calls,
            success_count: inner.success_count,
            failure_count: inner.failure_count,
            rejected_count: inner.rejected_count,
            consecutive_failures: inner.consecutive_failures,
            times_opened: inner.times_opened,
            current_state: inner.state,
            failure_rate,
        }
    }
}

impl CircuitPermit<'_> {
    /// Whether this permit is the half-open trial call
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// The endpoint answered in a way that says it is healthy
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    /// The attempt failed transiently
    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandoned(self.trial);
        }
    }
}
