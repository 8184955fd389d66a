//! Credential providers.
//!
//! The interactive consent flow is out of scope: a provider either holds a
//! token handed to it, or exchanges a long-lived refresh token for short-lived
//! access tokens at the OAuth token endpoint.

use crate::types::TokenResponse;
use async_trait::async_trait;
use cadence_core::{AccessToken, CadenceError, CredentialProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Lifetime assumed when the endpoint does not report one
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// A fixed bearer token.
///
/// Once the API rejects it there is nothing to re-acquire; every later call
/// fails the same way until the user supplies a new one.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> cadence_core::Result<AccessToken> {
        if self.token.secret().is_empty() {
            return Err(CadenceError::auth("no access token configured"));
        }
        Ok(self.token.clone())
    }
}

/// OAuth client credentials plus a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

struct CachedToken {
    token: AccessToken,
    refresh_at: Instant,
}

/// Exchanges a refresh token for access tokens, caching each until shortly
/// before it expires.
pub struct RefreshTokenProvider {
    http: Client,
    config: RefreshTokenConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenProvider {
    pub fn new(config: RefreshTokenConfig) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            config,
            cached: Mutex::new(None),
        })
    }

    fn cached_token(&self) -> Option<AccessToken> {
        let cached = self.cached.lock().ok()?;
        cached
            .as_ref()
            .filter(|c| Instant::now() < c.refresh_at)
            .map(|c| c.token.clone())
    }

    async fn exchange(&self) -> cadence_core::Result<TokenResponse> {
        debug!(url = %self.config.token_url, "Refreshing access token");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CadenceError::fetch(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Refresh token rejected");
            return Err(CadenceError::auth(format!(
                "refresh rejected ({}): {}",
                status.as_u16(),
                body
            )));
        }
        if !status.is_success() {
            return Err(CadenceError::fetch(format!(
                "token endpoint returned {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CadenceError::fetch(format!("bad token response: {}", e)))
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn access_token(&self) -> cadence_core::Result<AccessToken> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let response = self.exchange().await?;
        let lifetime = response
            .expires_in
            .map_or(DEFAULT_LIFETIME, Duration::from_secs);
        let token = AccessToken::new(response.access_token);

        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(CachedToken {
                token: token.clone(),
                refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
            });
        }

        info!(expires_in = lifetime.as_secs(), "Access token refreshed");
        Ok(token)
    }

    fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.lock() {
            if cached.take().is_some() {
                debug!("Cached access token dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap().secret(), "abc");
    }

    #[tokio::test]
    async fn empty_static_token_is_an_auth_error() {
        let provider = StaticTokenProvider::new("");
        assert!(provider.access_token().await.unwrap_err().is_auth());
    }

    #[test]
    fn token_url_defaults_to_google() {
        let config: RefreshTokenConfig = serde_json::from_value(serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh"
        }))
        .unwrap();
        assert_eq!(config.token_url, "https://oauth2.googleapis.com/token");
    }
}
