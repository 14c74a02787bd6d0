#![allow(clippy::doc_markdown)] // Allow technical terms like OAuth2, reqwest in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Resource Client
//!
//! Resilient remote-data access layer for HTTP resource services.
//!
//! ## Overview
//!
//! Application code asks for records ("list customers", "get customer 42",
//! "create order") and the client transparently handles:
//!
//! - **Response caching** with per-operation TTLs and explicit invalidation on writes
//! - **Bearer-token lifecycle** including silent renewal when the service rejects a token
//! - **Transient-failure resilience** via bounded retries with backoff and per-endpoint circuit breakers
//!
//! Every failure reaches the caller as a [`ClassifiedError`].
//!
//! ## Module Organization
//!
//! - [`client`] - The resource client orchestrating all of the below
//! - [`cache`] - Process-local TTL cache with glob invalidation
//! - [`auth`] - Credential manager and token providers
//! - [`resilience`] - Retry policy, circuit breakers and their metrics
//! - [`classifier`] - Outcome to error-kind mapping
//! - [`transport`] - The outbound HTTP seam
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_client::{ClientConfig, ResourceClient};
//!
//! let mut config = ClientConfig::default();
//! config.base_url = "https://api.example.com".to_string();
//! config.auth.static_token = Some("token".to_string());
//!
//! let client = ResourceClient::new(config).expect("valid configuration");
//! assert!(!client.is_authenticated());
//!
//! tokio_test::block_on(async {
//!     // The first request fetches the token from the configured provider
//!     let token = client.credentials().get_token().await.unwrap();
//!     assert_eq!(token, "token");
//!     assert!(client.is_authenticated());
//! });
//! ```

pub mod auth;
pub mod cache;
pub mod classifier;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod transport;

pub use auth::{Credential, CredentialManager, TokenProvider};
pub use cache::CacheStore;
pub use client::{ResourceClient, ResourceClientBuilder};
pub use crate::config::ClientConfig;
pub use error::{AuthenticationError, ClassifiedError, ClientResult, ConfigurationError};
pub use models::{DomainRecord, ListQuery, MutationKind, QueryParams, RecordPage};
pub use transport::{CallOutcome, Transport};
