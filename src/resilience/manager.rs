//! # Circuit Breaker Manager
//!
//! Manages one circuit breaker per remote endpoint (resource) so that a
//! failing resource does not fail fast for healthy ones. Provides centralized
//! control and metrics aggregation.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, SystemCircuitBreakerMetrics,
};

/// Manager for circuit breakers across endpoints
#[derive(Debug)]
pub struct CircuitBreakerManager {
    circuit_breakers: DashMap<String, Arc<CircuitBreaker>>,

    /// Configuration applied to every circuit created by this manager
    config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        info!(
            failure_threshold = config.failure_threshold,
            cooldown_ms = config.cooldown.as_millis() as u64,
            "Initializing circuit breaker manager"
        );

        Self {
            circuit_breakers: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get or create the circuit breaker for an endpoint
    pub fn get_circuit_breaker(&self, endpoint: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.circuit_breakers.get(endpoint) {
            return Arc::clone(breaker.value());
        }

        // The entry API holds the shard lock, so racing creators agree on one breaker
        let breaker = self
            .circuit_breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(endpoint, self.config.clone())))
            .value()
            .clone();

        info!(
            component = endpoint,
            total_circuit_breakers = self.circuit_breakers.len(),
            "Created new circuit breaker"
        );

        breaker
    }

    /// Get all circuit breaker names, sorted
    pub fn list_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .circuit_breakers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Get metrics for a specific circuit breaker
    pub fn get_component_metrics(&self, endpoint: &str) -> Option<CircuitBreakerMetrics> {
        self.circuit_breakers
            .get(endpoint)
            .map(|breaker| breaker.metrics())
    }

    /// Get metrics for every circuit breaker
    pub fn get_system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let circuit_breakers: HashMap<String, CircuitBreakerMetrics> = self
            .circuit_breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().metrics()))
            .collect();

        SystemCircuitBreakerMetrics { circuit_breakers }
    }

    /// Force open all circuit breakers (emergency stop)
    pub fn force_open_all(&self) {
        warn!("🚨 Forcing all circuit breakers open (emergency stop)");
        for entry in self.circuit_breakers.iter() {
            entry.value().force_open();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub fn force_close_all(&self) {
        warn!("🚨 Forcing all circuit breakers closed (emergency recovery)");
        for entry in self.circuit_breakers.iter() {
            entry.value().force_closed();
        }
    }

    /// Remove the circuit breaker for an endpoint
    pub fn remove_circuit_breaker(&self, endpoint: &str) -> bool {
        let removed = self.circuit_breakers.remove(endpoint).is_some();
        if removed {
            info!(
                component = endpoint,
                remaining_count = self.circuit_breakers.len(),
                "Removed circuit breaker"
            );
        }
        removed
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
