//! Graph API connection configuration

use crate::error::{Error, Result};
use std::env;
use std::fmt;

pub const DEFAULT_API_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";

/// App registration credentials and endpoints for Microsoft Graph
#[derive(Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Graph REST root, without trailing slash.
    pub api_url: String,
    /// Identity platform root, without trailing slash.
    pub login_url: String,
}

impl GraphConfig {
    /// Config pointing at the public Graph and login endpoints.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    /// Load Graph configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `GRAPH_TENANT_ID`
    /// - `GRAPH_CLIENT_ID`
    /// - `GRAPH_CLIENT_SECRET`
    ///
    /// Optional (with defaults):
    /// - `GRAPH_API_URL` (default: `https://graph.microsoft.com/v1.0`)
    /// - `GRAPH_LOGIN_URL` (default: `https://login.microsoftonline.com`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            tenant_id: required("GRAPH_TENANT_ID")?,
            client_id: required("GRAPH_CLIENT_ID")?,
            client_secret: required("GRAPH_CLIENT_SECRET")?,
            api_url: trim_url(
                env::var("GRAPH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            ),
            login_url: trim_url(
                env::var("GRAPH_LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string()),
            ),
        })
    }

    /// Token endpoint for the client-credential grant.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_url, self.tenant_id)
    }

    /// `.default` scope derived from the API root's origin.
    #[must_use]
    pub fn scope(&self) -> String {
        let origin = self
            .api_url
            .splitn(4, '/')
            .take(3)
            .collect::<Vec<_>>()
            .join("/");
        format!("{origin}/.default")
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("login_url", &self.login_url)
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{name} not set"))),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
