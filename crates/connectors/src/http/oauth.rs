//! OAuth2 client-credentials token lifecycle
//!
//! Tokens are cached per [`OAuthTokenSource`] and refreshed once they expire
//! within [`EXPIRY_MARGIN_SECS`]. The cache lock is held across a login so
//! concurrent callers on one source wait for a single login instead of each
//! starting their own.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{HttpRequest, HttpTransport};
use crate::TransportError;

/// Tokens expiring within this many seconds are refreshed before use
pub const EXPIRY_MARGIN_SECS: i64 = 5;

/// Client-credentials grant configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Token response from the authorization server
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// `None` when the server did not say
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn usable_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }
}

/// Cached OAuth2 access token for one set of credentials
pub struct OAuthTokenSource {
    config: OAuthConfig,
    cache: Mutex<Option<CachedToken>>,
}

impl OAuthTokenSource {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Get a usable access token, logging in first if needed
    pub fn token(&self, transport: &dyn HttpTransport) -> Result<String, TransportError> {
        self.token_at(transport, Utc::now())
    }

    /// Drop the cached token so the next call logs in again
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub(crate) fn token_at(
        &self,
        transport: &dyn HttpTransport,
        now: DateTime<Utc>,
    ) -> Result<String, TransportError> {
        let mut cache = self.lock();

        if let Some(token) = cache.as_ref()
            && token.usable_at(now)
        {
            return Ok(token.access_token.clone());
        }

        *cache = None;
        match self.login(transport, now) {
            Ok(token) => {
                let access_token = token.access_token.clone();
                *cache = Some(token);
                Ok(access_token)
            }
            Err(e) => {
                log::warn!("OAuth login to {} failed: {}", self.config.token_url, e);
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedToken>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn login(
        &self,
        transport: &dyn HttpTransport,
        now: DateTime<Utc>,
    ) -> Result<CachedToken, TransportError> {
        let scope = self.config.scopes.join(" ");
        let mut fields = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if !scope.is_empty() {
            fields.push(("scope", scope.as_str()));
        }

        let request = HttpRequest::post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(fields);

        let response = transport.execute(&request).map_err(|e| TransportError::OAuth {
            message: e.to_string(),
            status: None,
        })?;

        if !(200..300).contains(&response.status) {
            return Err(TransportError::OAuth {
                message: format!("token endpoint returned status {}", response.status),
                status: Some(response.status),
            });
        }

        let token: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|e| TransportError::OAuth {
                message: format!("invalid token response: {}", e),
                status: Some(response.status),
            })?;

        if token.access_token.is_empty() {
            return Err(TransportError::OAuth {
                message: "token endpoint returned an empty access token".into(),
                status: Some(response.status),
            });
        }

        log::info!("Obtained OAuth token for client {}", self.config.client_id);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: token.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }
}
