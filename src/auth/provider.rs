//! Token sources the credential manager renews from.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Credential;
use crate::config::AuthConfig;
use crate::error::{AuthResult, AuthenticationError, ConfigResult, ConfigurationError};

/// Obtains a fresh credential from wherever credentials come from
#[async_trait]
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    async fn fetch_token(&self) -> AuthResult<Credential>;
}

/// Hands out a fixed, pre-issued token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").finish_non_exhaustive()
    }
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        if self.token.is_empty() {
            return Err(AuthenticationError::NotConfigured);
        }
        Ok(Credential::new(self.token.clone()))
    }
}

/// Used when no credential source is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTokenProvider;

#[async_trait]
impl TokenProvider for NoTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        Err(AuthenticationError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// OAuth2-style token endpoint
///
/// Uses the `refresh_token` grant while a refresh token is held (storing any
/// rotated one the endpoint returns), otherwise `client_credentials`.
pub struct HttpTokenProvider {
    client: Client,
    token_url: Url,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: RwLock<Option<String>>,
}

impl std::fmt::Debug for HttpTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenProvider")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl HttpTokenProvider {
    pub fn new(
        token_url: &str,
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
        timeout: Duration,
    ) -> ConfigResult<Self> {
        let token_url = Url::parse(token_url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token_url,
            client_id,
            client_secret,
            refresh_token: RwLock::new(refresh_token),
        })
    }

    /// Build from the `auth` section; fails if no `token_url` is set
    pub fn from_config(auth: &AuthConfig, timeout: Duration) -> ConfigResult<Self> {
        let token_url = auth
            .token_url
            .as_deref()
            .ok_or_else(|| ConfigurationError::invalid("auth.token_url is required"))?;

        Self::new(
            token_url,
            auth.client_id.clone(),
            auth.client_secret.clone(),
            auth.refresh_token.clone(),
            timeout,
        )
    }

    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = Vec::with_capacity(4);
        match self.refresh_token.read().clone() {
            Some(refresh_token) => {
                form.push(("grant_type", "refresh_token".to_string()));
                form.push(("refresh_token", refresh_token));
            }
            None => form.push(("grant_type", "client_credentials".to_string())),
        }
        if let Some(client_id) = &self.client_id {
            form.push(("client_id", client_id.clone()));
        }
        if let Some(client_secret) = &self.client_secret {
            form.push(("client_secret", client_secret.clone()));
        }
        form
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> AuthResult<Credential> {
        let form = self.form();
        debug!(token_url = %self.token_url, grant_type = %form[0].1, "Requesting access token");

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthenticationError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthenticationError::Unreachable(e.to_string()))?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            warn!(status = status.as_u16(), "Token endpoint rejected credentials");
            return Err(AuthenticationError::Rejected(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(AuthenticationError::Unreachable(format!("HTTP {status}")));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthenticationError::InvalidResponse(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(AuthenticationError::InvalidResponse(
                "empty access_token".to_string(),
            ));
        }

        if let Some(rotated) = parsed.refresh_token {
            *self.refresh_token.write() = Some(rotated);
        }

        let credential = match parsed.expires_in {
            Some(seconds) => Credential::expiring_in(parsed.access_token, Duration::from_secs(seconds)),
            None => Credential::new(parsed.access_token),
        };

        info!(expires_at = ?credential.expires_at, "Obtained access token");
        Ok(credential)
    }
}
