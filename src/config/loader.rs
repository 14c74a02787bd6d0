//! Configuration loading
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`RESOURCE_CLIENT__TIMEOUT_MS`, `RESOURCE_CLIENT__RESILIENCE__MAX_RETRY_ATTEMPTS`, ...)
//! 2. Config file (`$RESOURCE_CLIENT_CONFIG`, `./resource-client.toml`, `./config/resource-client.toml`)
//! 3. Default values
//!
//! The loaded configuration is validated before it is returned.

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ClientConfig;
use crate::error::ConfigResult;

/// Prefix for environment overrides; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "RESOURCE_CLIENT";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "RESOURCE_CLIENT_CONFIG";

impl ClientConfig {
    /// Load configuration from defaults, an optional config file and the environment
    pub fn load() -> ConfigResult<Self> {
        let path = Self::find_config_file();
        load_with(path.as_deref(), ENV_PREFIX)
    }

    /// Load configuration from a specific file, with environment overrides applied
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        load_with(Some(path), ENV_PREFIX)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }

        [
            Path::new("./resource-client.toml"),
            Path::new("./config/resource-client.toml"),
        ]
        .into_iter()
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
    }
}

pub(crate) fn load_with(path: Option<&Path>, env_prefix: &str) -> ConfigResult<ClientConfig> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        debug!(path = %path.display(), "Loading client config file");
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .separator("__")
            .try_parsing(true),
    );

    let config: ClientConfig = builder.build()?.try_deserialize()?;
    config.validate()?;

    debug!(
        base_url = %config.base_url,
        timeout_ms = config.timeout_ms,
        max_retry_attempts = config.resilience.max_retry_attempts,
        "Loaded client configuration"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file_merges_with_defaults() {
        let file = write_config(
            r#"
base_url = "https://records.example.com"
timeout_ms = 5000

[resilience]
max_retry_attempts = 5
circuit_failure_threshold = 8

[cache.ttl_by_operation_ms]
list = 15000
"customers:get" = 90000
"#,
        );

        let config = load_with(Some(file.path()), "RC_LOADER_TEST_MERGE").unwrap();
        assert_eq!(config.base_url, "https://records.example.com");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.resilience.max_retry_attempts, 5);
        assert_eq!(config.resilience.circuit_failure_threshold, 8);
        // Untouched fields keep their defaults
        assert_eq!(
            config.resilience.base_backoff_ms,
            crate::constants::defaults::BASE_BACKOFF_MS
        );
        assert_eq!(
            config.cache.ttl_for("customers", "get"),
            std::time::Duration::from_millis(90000)
        );
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let file = write_config(
            r#"
[resilience]
max_retry_attempts = 0
"#,
        );

        let result = load_with(Some(file.path()), "RC_LOADER_TEST_INVALID");
        assert!(matches!(result, Err(ConfigurationError::Validation(_))));
    }

    #[test]
    fn test_missing_required_file_is_load_error() {
        let result = load_with(
            Some(Path::new("/definitely/not/here/resource-client.toml")),
            "RC_LOADER_TEST_MISSING",
        );
        assert!(matches!(result, Err(ConfigurationError::Load(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config("timeout_ms = 5000\n");
        std::env::set_var("RC_LOADER_TEST_ENV__TIMEOUT_MS", "7500");

        let config = load_with(Some(file.path()), "RC_LOADER_TEST_ENV").unwrap();
        std::env::remove_var("RC_LOADER_TEST_ENV__TIMEOUT_MS");

        assert_eq!(config.timeout_ms, 7500);
    }
}
