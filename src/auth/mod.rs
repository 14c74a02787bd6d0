//! # Authentication
//!
//! Client-side credential lifecycle: holding the current bearer credential,
//! renewing it from a [`TokenProvider`], and reporting whether the session is
//! authenticated.

mod credential;
pub mod manager;
pub mod provider;

pub use credential::Credential;
pub use manager::CredentialManager;
pub use provider::{HttpTokenProvider, NoTokenProvider, StaticTokenProvider, TokenProvider};

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::ConfigResult;

/// Choose a token provider from the `auth` section
///
/// A `token_url` wins over a `static_token`; with neither, every renewal fails
/// with `NotConfigured`.
pub fn provider_from_config(
    auth: &AuthConfig,
    timeout: std::time::Duration,
) -> ConfigResult<Arc<dyn TokenProvider>> {
    if auth.token_url.is_some() {
        return Ok(Arc::new(HttpTokenProvider::from_config(auth, timeout)?));
    }
    if let Some(token) = &auth.static_token {
        return Ok(Arc::new(StaticTokenProvider::new(token.clone())));
    }
    Ok(Arc::new(NoTokenProvider))
}
