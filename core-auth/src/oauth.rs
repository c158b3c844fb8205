//! OAuth 2.0 refresh-token grant
//!
//! [`RefreshTokenProvider`] exchanges a long-lived refresh token for short
//! lived access tokens and caches them per scope set until they come within
//! five minutes of expiry.
//!
//! # Example
//!
//! ```ignore
//! use core_auth::{CredentialProvider, RefreshTokenConfig, RefreshTokenProvider, Scope};
//!
//! let provider = RefreshTokenProvider::new(
//!     RefreshTokenConfig::google(client_id, client_secret, refresh_token),
//!     http_client,
//! );
//! let token = provider.authorize(&[Scope::DRIVE_READONLY]).await?;
//! ```

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::provider::CredentialProvider;
use crate::types::AccessToken;

/// Google's OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Client registration and refresh token for the grant
#[derive(Clone)]
pub struct RefreshTokenConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
    pub token_url: String,
}

impl RefreshTokenConfig {
    /// Configuration against Google's token endpoint.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            refresh_token: refresh_token.into(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::InvalidConfig("client_id is empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfig("refresh_token is empty".to_string()));
        }
        if self.token_url.trim().is_empty() {
            return Err(AuthError::InvalidConfig("token_url is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for RefreshTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Credential provider backed by the OAuth 2.0 refresh-token grant
pub struct RefreshTokenProvider {
    config: RefreshTokenConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    retry_policy: RetryPolicy,
    /// Cached tokens keyed by the sorted, space-joined scope list
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl RefreshTokenProvider {
    pub fn new(config: RefreshTokenConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            clock: Arc::new(SystemClock),
            retry_policy: RetryPolicy::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn cache_key(scopes: &[&str]) -> String {
        let mut sorted: Vec<&str> = scopes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.join(" ")
    }

    /// Exchange the refresh token for a fresh access token.
    ///
    /// Server errors are retried with exponential backoff; client errors
    /// (revoked grant, bad client) fail immediately.
    #[instrument(skip(self), fields(token_url = %self.config.token_url))]
    async fn refresh(&self, scope: &str) -> Result<AccessToken> {
        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];

        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }
        if !scope.is_empty() {
            params.push(("scope", scope));
        }

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;
        let body = Bytes::from(encoded_body);

        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body.clone());

            let response = self
                .http_client
                .execute_with_retry(request, RetryPolicy::no_retry())
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                info!(expires_in = token_response.expires_in, "Refreshed access token");

                let granted: Vec<String> = match token_response.scope {
                    Some(granted) => granted.split_whitespace().map(str::to_string).collect(),
                    None => scope.split_whitespace().map(str::to_string).collect(),
                };

                let mut token = AccessToken::expiring_in(
                    token_response.access_token,
                    self.clock.now(),
                    token_response.expires_in,
                );
                token.scopes = granted;
                return Ok(token);
            }

            let status = response.status;

            if response.is_client_error() {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                warn!(status, error = %error_body, "Token refresh failed without retry");

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            if attempts >= max_attempts {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = self.retry_policy.delay_for(attempts);
            warn!(
                status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn authorize(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.config.validate()?;

        let key = Self::cache_key(scopes);
        // Held across the refresh so concurrent callers share one grant
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.get(&key) {
            if !token.is_expired_at(self.clock.now()) {
                debug!(scopes = %key, "Using cached access token");
                return Ok(token.clone());
            }
            debug!(scopes = %key, "Cached access token is about to expire");
        }

        let token = self.refresh(&key).await?;
        cache.insert(key, token.clone());
        Ok(token)
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}
