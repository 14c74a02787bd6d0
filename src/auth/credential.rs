use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bearer credential for the remote service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    /// `None` when the issuer did not say
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    /// Credential with unknown expiry
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Credential expiring `lifetime` from now, as reported by `expires_in`
    pub fn expiring_in(token: impl Into<String>, lifetime: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Present and not past its expiry; an unknown expiry counts as valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && self.expires_at.map_or(true, |at| Utc::now() < at)
    }

    /// Expires within `window` from now (or already has)
    #[must_use]
    pub fn is_stale(&self, window: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        match chrono::Duration::from_std(window) {
            Ok(window) => Utc::now()
                .checked_add_signed(window)
                .map_or(true, |horizon| horizon >= expires_at),
            Err(_) => true,
        }
    }
}
