//! # Error Types
//!
//! `ClassifiedError` is the only error shape surfaced by resource operations.
//! Expected remote failures travel as values; nothing in the request path panics.
//! `AuthenticationError` and `ConfigurationError` cover credential renewal and
//! client construction respectively.

use thiserror::Error;

/// Result type for resource operations
pub type ClientResult<T> = Result<T, ClassifiedError>;

/// Result type for credential operations
pub type AuthResult<T> = Result<T, AuthenticationError>;

/// Result type for configuration loading and client construction
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Closed taxonomy of remote-call failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    #[error("Unauthorized: credential rejected by remote service")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote service fault")]
    ServerFault,

    #[error("Remote service temporarily unavailable")]
    TransientUnavailable,

    #[error("Unexpected remote outcome: {0}")]
    Unknown(String),
}

impl ClassifiedError {
    /// Check if error is worth retrying unchanged
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClassifiedError::ServerFault | ClassifiedError::TransientUnavailable
        )
    }

    /// Short machine-friendly label for structured logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedError::Unauthorized => "unauthorized",
            ClassifiedError::InvalidInput(_) => "invalid_input",
            ClassifiedError::NotFound => "not_found",
            ClassifiedError::Conflict(_) => "conflict",
            ClassifiedError::ServerFault => "server_fault",
            ClassifiedError::TransientUnavailable => "transient_unavailable",
            ClassifiedError::Unknown(_) => "unknown",
        }
    }
}

/// Failures while obtaining or renewing an access credential
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("Refresh credential rejected: {0}")]
    Rejected(String),

    #[error("Token endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("No credential source configured")]
    NotConfigured,
}

impl From<AuthenticationError> for ClassifiedError {
    fn from(error: AuthenticationError) -> Self {
        match error {
            // The token endpoint being down says nothing about the session
            AuthenticationError::Unreachable(_) => ClassifiedError::TransientUnavailable,
            _ => ClassifiedError::Unauthorized,
        }
    }
}

/// Programming-contract violations detected at construction time
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigurationError {
    /// Create a validation error from a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}
