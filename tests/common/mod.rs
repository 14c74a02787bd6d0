#![allow(dead_code)]

pub mod scripted_transport;
pub mod strategies;
pub mod token_providers;

pub use scripted_transport::*;
pub use token_providers::*;

use resource_client::ClientConfig;

/// Defaults with millisecond backoff so retry tests stay fast
pub fn fast_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.base_url = "http://resource-service.test".to_string();
    config.timeout_ms = 1_000;
    config.resilience.base_backoff_ms = 1;
    config.resilience.max_backoff_ms = 10;
    config
}
