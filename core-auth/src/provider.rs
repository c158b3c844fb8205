//! Credential providers
//!
//! A [`CredentialProvider`] turns a set of requested scopes into a bearer
//! token the API connectors can use.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::types::AccessToken;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a token valid for every scope in `scopes`.
    async fn authorize(&self, scopes: &[&str]) -> Result<AccessToken>;
}

/// Hands out a pre-issued token
///
/// The token is assumed to carry whatever scopes were granted when it was
/// minted; requested scopes are recorded on the returned copy.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }

    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn authorize(&self, scopes: &[&str]) -> Result<AccessToken> {
        if self.token.secret().is_empty() {
            return Err(AuthError::NotAuthenticated);
        }

        debug!(scopes = ?scopes, "Using static access token");
        Ok(self.token.clone().with_scopes(scopes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scope;

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("ya29.token");

        let token = provider.authorize(&[Scope::DRIVE_READONLY]).await.unwrap();

        assert_eq!(token.secret(), "ya29.token");
        assert!(token.covers(&[Scope::DRIVE_READONLY]));
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty_token() {
        let provider = StaticTokenProvider::new("");

        let result = provider.authorize(&[Scope::DRIVE_READONLY]).await;

        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }
}
