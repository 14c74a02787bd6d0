//! # Circuit Breaker Metrics
//!
//! Snapshots of circuit breaker counters for monitoring and diagnostics.

use serde::Serialize;
use std::collections::HashMap;

use crate::resilience::CircuitState;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    /// Calls that were allowed through and completed
    pub total_calls: u64,

    pub success_count: u64,

    /// Transient failures (transport errors, 5xx, 429)
    pub failure_count: u64,

    /// Calls rejected without being attempted
    pub rejected_count: u64,

    pub consecutive_failures: u32,

    /// How many times the circuit has transitioned to open
    pub times_opened: u64,

    pub current_state: CircuitState,

    /// Calculated failure rate (0.0 to 1.0)
    pub failure_rate: f64,
}

impl CircuitBreakerMetrics {
    /// Create new metrics instance with zero values
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            rejected_count: 0,
            consecutive_failures: 0,
            times_opened: 0,
            current_state: CircuitState::Closed,
            failure_rate: 0.0,
        }
    }

    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self.failure_rate < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing endpoint health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Failures: {} | Rejected: {} | Failure rate: {:.1}%",
            self.state_description(),
            self.total_calls,
            self.failure_count,
            self.rejected_count,
            self.failure_rate * 100.0
        )
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for every circuit owned by a client, keyed by endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SystemCircuitBreakerMetrics {
    pub circuit_breakers: HashMap<String, CircuitBreakerMetrics>,
}

impl SystemCircuitBreakerMetrics {
    /// Endpoints whose circuit is not closed
    pub fn unhealthy_endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = self
            .circuit_breakers
            .iter()
            .filter(|(_, metrics)| metrics.current_state != CircuitState::Closed)
            .map(|(name, _)| name.as_str())
            .collect();
        endpoints.sort_unstable();
        endpoints
    }
}
