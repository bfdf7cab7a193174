//! Client-credential token acquisition
//!
//! Exchanges the app registration's id and secret for a bearer token at
//! the tenant's token endpoint and caches it until shortly before expiry.

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::wire::{TokenError, TokenResponse};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tokio::sync::Mutex;
use tracing::debug;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the endpoint does not report `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        Self {
            value: response.access_token,
            expires_at: now + Duration::seconds(lifetime),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Cached client-credential token source.
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    #[must_use]
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope(),
            cached: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, fetching a new one if the cached
    /// token is missing or about to expire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the token endpoint rejects the
    /// credentials, or [`Error::Http`] on transport failure.
    pub async fn bearer(&self, http: &reqwest::Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting access token from {}", self.token_url);
        let token = AccessToken::from_response(self.request(http).await?, now);
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request(&self, http: &reqwest::Client) -> Result<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = http.post(&self.token_url).form(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenError>(&body).map_or_else(
                |_| format!("token endpoint returned {status}"),
                |e| format!("{}: {}", e.error, e.error_description),
            );
            return Err(Error::Auth(reason));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("Invalid token response: {e}")))
    }
}
