//! # Dashboard Configuration Module
//!
//! Provides configuration management for the drive dashboard.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `DashboardConfig` holding the HTTP bridge, credentials, remote
//! identifiers and traversal limits. It enforces fail-fast validation so a
//! misconfigured deployment is rejected before any remote call is made.
//!
//! ## Required Settings
//!
//! - Shared drive id
//! - Operator password
//! - Credentials (a pre-issued access token or a refresh-token grant)
//!
//! ## Optional Settings
//!
//! - `HttpClient` (desktop default: reqwest, under the `desktop-shims` feature)
//! - Sheet id (enables the sheet summary)
//! - Token dataset file id (enables the rank-frequency series)
//! - Traversal limits (defaults: 4 listings in flight, depth 64)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::DashboardConfig;
//!
//! let config = DashboardConfig::builder()
//!     .shared_drive_id("0AAbcDEF")
//!     .operator_password("hunter2")
//!     .access_token("ya29.a0...")
//!     .build()?;
//! ```
//!
//! Or from the process environment:
//!
//! ```ignore
//! use core_runtime::config::DashboardConfigBuilder;
//!
//! let config = DashboardConfigBuilder::from_env()?.build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::fmt;
use std::sync::Arc;

/// Google's OAuth 2.0 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Upper bound for concurrent container listings
pub const MAX_CONCURRENCY_LIMIT: usize = 64;

/// Upper bound for the traversal depth limit
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Environment variables read by [`DashboardConfigBuilder::from_env`]
pub mod env_keys {
    pub const APP_PASSWORD: &str = "APP_PASSWORD";
    pub const SHARED_DRIVE_ID: &str = "SHARED_DRIVE_ID";
    pub const SHEET_ID: &str = "SHEET_ID";
    pub const TOKEN_DATASET_FILE_ID: &str = "UNIQUE_JSON_ID";
    pub const ACCESS_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";
    pub const CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
    pub const REFRESH_TOKEN: &str = "GOOGLE_REFRESH_TOKEN";
    pub const TOKEN_URL: &str = "GOOGLE_TOKEN_URL";
    pub const MAX_CONCURRENCY: &str = "DRIVE_TREE_MAX_CONCURRENCY";
    pub const MAX_DEPTH: &str = "DRIVE_TREE_MAX_DEPTH";
}

/// How the dashboard obtains bearer tokens
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSettings {
    /// A pre-issued access token
    AccessToken(String),
    /// OAuth 2.0 refresh-token grant
    RefreshToken {
        client_id: String,
        client_secret: Option<String>,
        refresh_token: String,
        token_url: String,
    },
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSettings::AccessToken(_) => {
                f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
            }
            CredentialSettings::RefreshToken {
                client_id,
                token_url,
                ..
            } => f
                .debug_struct("RefreshToken")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("refresh_token", &"[REDACTED]")
                .field("token_url", token_url)
                .finish(),
        }
    }
}

impl CredentialSettings {
    fn validate(&self) -> Result<()> {
        match self {
            CredentialSettings::AccessToken(token) if token.trim().is_empty() => Err(
                Error::Config("Access token cannot be empty".to_string()),
            ),
            CredentialSettings::RefreshToken {
                client_id,
                refresh_token,
                token_url,
                ..
            } => {
                if client_id.trim().is_empty() {
                    return Err(Error::Config("OAuth client id cannot be empty".to_string()));
                }
                if refresh_token.trim().is_empty() {
                    return Err(Error::Config("Refresh token cannot be empty".to_string()));
                }
                if token_url.trim().is_empty() {
                    return Err(Error::Config("Token URL cannot be empty".to_string()));
                }
                Ok(())
            }
            CredentialSettings::AccessToken(_) => Ok(()),
        }
    }
}

/// Limits applied to drive tree traversals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalSettings {
    /// Container listings allowed in flight at once
    pub max_concurrency: usize,
    /// Nesting limit below the root folder
    pub max_depth: usize,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_depth: 64,
        }
    }
}

/// Dashboard configuration.
///
/// Use [`DashboardConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct DashboardConfig {
    /// HTTP client shared by every connector
    pub http_client: Arc<dyn HttpClient>,

    pub credentials: CredentialSettings,

    /// Shared drive whose hierarchy is displayed
    pub shared_drive_id: String,

    /// Spreadsheet holding the summary rows
    pub sheet_id: Option<String>,

    /// Drive file holding the token-frequency JSON
    pub token_dataset_file_id: Option<String>,

    /// Single operator password
    pub operator_password: String,

    pub traversal: TraversalSettings,
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("credentials", &self.credentials)
            .field("shared_drive_id", &self.shared_drive_id)
            .field("sheet_id", &self.sheet_id)
            .field("token_dataset_file_id", &self.token_dataset_file_id)
            .field("operator_password", &"[REDACTED]")
            .field("traversal", &self.traversal)
            .finish()
    }
}

impl DashboardConfig {
    /// Creates a new builder for constructing a `DashboardConfig`.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Shared drive id and operator password are not empty
    /// - Credential fields are not empty
    /// - Traversal limits are within range
    pub fn validate(&self) -> Result<()> {
        if self.shared_drive_id.trim().is_empty() {
            return Err(Error::Config(
                "Shared drive id cannot be empty. Set SHARED_DRIVE_ID or use .shared_drive_id()."
                    .to_string(),
            ));
        }

        if self.operator_password.is_empty() {
            return Err(Error::Config(
                "Operator password cannot be empty. Set APP_PASSWORD or use .operator_password()."
                    .to_string(),
            ));
        }

        self.credentials.validate()?;

        let TraversalSettings {
            max_concurrency,
            max_depth,
        } = self.traversal;

        if !(1..=MAX_CONCURRENCY_LIMIT).contains(&max_concurrency) {
            return Err(Error::Config(format!(
                "Traversal concurrency must be between 1 and {} (got {})",
                MAX_CONCURRENCY_LIMIT, max_concurrency
            )));
        }

        if !(1..=MAX_DEPTH_LIMIT).contains(&max_depth) {
            return Err(Error::Config(format!(
                "Traversal depth must be between 1 and {} (got {})",
                MAX_DEPTH_LIMIT, max_depth
            )));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: format!("Default reqwest client could not be created: {}", e),
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for Google API access. \
                 Enable the 'desktop-shims' feature to use the default reqwest client, \
                 or inject one with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`DashboardConfig`] instances.
#[derive(Default)]
pub struct DashboardConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    credentials: Option<CredentialSettings>,
    shared_drive_id: Option<String>,
    sheet_id: Option<String>,
    token_dataset_file_id: Option<String>,
    operator_password: Option<String>,
    traversal: TraversalSettings,
}

impl DashboardConfigBuilder {
    /// Builder seeded from the process environment.
    ///
    /// Reads `APP_PASSWORD`, `SHARED_DRIVE_ID`, `SHEET_ID`, `UNIQUE_JSON_ID`,
    /// `GOOGLE_ACCESS_TOKEN` (or `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
    /// `GOOGLE_REFRESH_TOKEN` and optionally `GOOGLE_TOKEN_URL`),
    /// `DRIVE_TREE_MAX_CONCURRENCY` and `DRIVE_TREE_MAX_DEPTH`.
    ///
    /// Missing values are left for [`build`](Self::build) to report; values
    /// that are present but malformed are rejected here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = Self::default();
        builder.operator_password = get(env_keys::APP_PASSWORD);
        builder.shared_drive_id = get(env_keys::SHARED_DRIVE_ID);
        builder.sheet_id = get(env_keys::SHEET_ID);
        builder.token_dataset_file_id = get(env_keys::TOKEN_DATASET_FILE_ID);

        builder.credentials = match (get(env_keys::ACCESS_TOKEN), get(env_keys::REFRESH_TOKEN)) {
            (Some(token), _) => Some(CredentialSettings::AccessToken(token)),
            (None, Some(refresh_token)) => Some(CredentialSettings::RefreshToken {
                client_id: get(env_keys::CLIENT_ID).unwrap_or_default(),
                client_secret: get(env_keys::CLIENT_SECRET),
                refresh_token,
                token_url: get(env_keys::TOKEN_URL)
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            }),
            (None, None) => None,
        };

        if let Some(raw) = get(env_keys::MAX_CONCURRENCY) {
            builder.traversal.max_concurrency = parse_limit(env_keys::MAX_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = get(env_keys::MAX_DEPTH) {
            builder.traversal.max_depth = parse_limit(env_keys::MAX_DEPTH, &raw)?;
        }

        Ok(builder)
    }

    /// Sets the HTTP client (optional with desktop default).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn credentials(mut self, credentials: CredentialSettings) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use a pre-issued access token.
    pub fn access_token(self, token: impl Into<String>) -> Self {
        self.credentials(CredentialSettings::AccessToken(token.into()))
    }

    /// Use the refresh-token grant against Google's token endpoint.
    pub fn refresh_token(
        self,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.credentials(CredentialSettings::RefreshToken {
            client_id: client_id.into(),
            client_secret,
            refresh_token: refresh_token.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        })
    }

    pub fn shared_drive_id(mut self, id: impl Into<String>) -> Self {
        self.shared_drive_id = Some(id.into());
        self
    }

    pub fn sheet_id(mut self, id: impl Into<String>) -> Self {
        self.sheet_id = Some(id.into());
        self
    }

    pub fn token_dataset_file_id(mut self, id: impl Into<String>) -> Self {
        self.token_dataset_file_id = Some(id.into());
        self
    }

    pub fn operator_password(mut self, password: impl Into<String>) -> Self {
        self.operator_password = Some(password.into());
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.traversal.max_concurrency = max_concurrency;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.traversal.max_depth = max_depth;
        self
    }

    /// Builds the final `DashboardConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(DashboardConfig)` on success, or an error if:
    /// - Required settings are missing (drive id, password, credentials)
    /// - No HTTP client was injected and no platform default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<DashboardConfig> {
        let shared_drive_id = self.shared_drive_id.ok_or_else(|| {
            Error::Config(
                "Shared drive id is required. Set SHARED_DRIVE_ID or use .shared_drive_id()."
                    .to_string(),
            )
        })?;

        let operator_password = self.operator_password.ok_or_else(|| {
            Error::Config(
                "Operator password is required. Set APP_PASSWORD or use .operator_password()."
                    .to_string(),
            )
        })?;

        let credentials = self.credentials.ok_or_else(|| Error::CapabilityMissing {
            capability: "Credentials".to_string(),
            message: "No Google credentials configured. Set GOOGLE_ACCESS_TOKEN, or \
                     GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET/GOOGLE_REFRESH_TOKEN, \
                     or use .access_token()/.refresh_token()."
                .to_string(),
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = DashboardConfig {
            http_client,
            credentials,
            shared_drive_id,
            sheet_id: self.sheet_id,
            token_dataset_file_id: self.token_dataset_file_id,
            operator_password,
            traversal: self.traversal,
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer (got '{}')", key, raw)))
}
