//! Core service façade for the drive dashboard.
//!
//! This crate wires a validated [`DashboardConfig`] into the shared Rust
//! core: it picks the credential provider, builds per-request API
//! connectors and exposes the three dashboard panels (drive hierarchy,
//! latest sheet row, token rank-frequency series) plus the operator
//! password check.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_analytics::ZipfSeries;
use core_auth::{
    AccessToken, CredentialProvider, OperatorGate, RefreshTokenConfig, RefreshTokenProvider,
    Scope, StaticTokenProvider,
};
use core_runtime::config::{CredentialSettings, DashboardConfig};
use provider_google_drive::{
    CollectionId, DriveApi, DriveTree, GoogleDriveConnector, ItemId, TraversalFailure,
    TreeBuilder, TreeBuilderConfig,
};
use provider_google_sheets::{GoogleSheetsConnector, SheetRecord};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

pub use provider_google_drive::connector::DRIVE_API_BASE;
pub use provider_google_sheets::SHEETS_API_BASE;

/// Everything the dashboard page shows, gathered in one pass
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    /// `{"<root id>": node}` or `{}`
    pub hierarchy: serde_json::Value,
    pub drive_tree: DriveTree,
    pub sheet_summary: Option<SheetRecord>,
    pub zipf_series: Option<ZipfSeries>,
}

/// Primary façade exposed to host applications.
///
/// Holds no per-request state: every call authorizes, builds fresh
/// connectors and a fresh tree builder.
pub struct DashboardService {
    config: DashboardConfig,
    credentials: Arc<dyn CredentialProvider>,
    operator: OperatorGate,
    drive_base_url: String,
    sheets_base_url: String,
}

impl DashboardService {
    /// Create a service from a configuration, choosing the credential
    /// provider its [`CredentialSettings`] describe.
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let credentials = credential_provider(&config);
        Ok(Self::with_credential_provider(config, credentials))
    }

    /// Create a service with an explicit credential provider.
    pub fn with_credential_provider(
        config: DashboardConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let operator = OperatorGate::new(Some(config.operator_password.as_str()));
        Self {
            config,
            credentials,
            operator,
            drive_base_url: DRIVE_API_BASE.to_string(),
            sheets_base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the Drive connector at another endpoint.
    pub fn with_drive_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.drive_base_url = base_url.into();
        self
    }

    /// Point the Sheets connector at another endpoint.
    pub fn with_sheets_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.sheets_base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Check a candidate operator password.
    pub fn verify_operator(&self, password: &str) -> bool {
        let accepted = self.operator.verify(password);
        if !accepted {
            warn!("Operator password rejected");
        }
        accepted
    }

    /// Traverse the configured shared drive.
    ///
    /// Never fails: a credential problem yields an empty tree tagged with
    /// [`TraversalFailure::Credential`] and no Drive call is made.
    #[instrument(skip(self), fields(collection_id = %self.config.shared_drive_id))]
    pub async fn drive_tree(&self) -> DriveTree {
        let collection = CollectionId::new(self.config.shared_drive_id.as_str());

        let token = match self.credentials.authorize(&[Scope::DRIVE_READONLY]).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Drive credentials unavailable");
                return DriveTree::empty(
                    collection,
                    TraversalFailure::Credential {
                        message: e.to_string(),
                    },
                );
            }
        };

        let api: Arc<dyn DriveApi> = Arc::new(self.drive_connector(&token));
        let builder = TreeBuilder::with_config(api, self.tree_config());
        builder.build_tree(&collection).await
    }

    /// Latest row of the configured spreadsheet, or `None` when no sheet
    /// is configured or it could not be read.
    #[instrument(skip(self))]
    pub async fn sheet_summary(&self) -> Option<SheetRecord> {
        let Some(sheet_id) = self.config.sheet_id.as_deref() else {
            debug!("No sheet configured");
            return None;
        };

        match self.fetch_sheet_summary(sheet_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Sheet summary unavailable");
                None
            }
        }
    }

    /// Rank-frequency series of the configured token dataset, or `None`
    /// when no dataset is configured or it could not be loaded.
    #[instrument(skip(self))]
    pub async fn zipf_series(&self) -> Option<ZipfSeries> {
        let Some(file_id) = self.config.token_dataset_file_id.as_deref() else {
            debug!("No token dataset configured");
            return None;
        };

        match self.fetch_zipf_series(file_id).await {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(error = %e, "Token rank-frequency series unavailable");
                None
            }
        }
    }

    /// Gather all panels concurrently.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let (drive_tree, sheet_summary, zipf_series) =
            tokio::join!(self.drive_tree(), self.sheet_summary(), self.zipf_series());

        info!(
            tree_complete = drive_tree.is_complete(),
            has_sheet_summary = sheet_summary.is_some(),
            has_zipf_series = zipf_series.is_some(),
            "Dashboard snapshot ready"
        );

        DashboardSnapshot {
            generated_at: Utc::now(),
            hierarchy: drive_tree.to_json(),
            drive_tree,
            sheet_summary,
            zipf_series,
        }
    }

    async fn fetch_sheet_summary(&self, sheet_id: &str) -> Result<Option<SheetRecord>> {
        let token = self
            .credentials
            .authorize(&[Scope::SPREADSHEETS_READONLY])
            .await?;
        let connector = GoogleSheetsConnector::new(
            Arc::clone(&self.config.http_client),
            token.secret().to_string(),
        )
        .with_base_url(self.sheets_base_url.as_str());

        Ok(connector.latest_record(sheet_id).await?)
    }

    async fn fetch_zipf_series(&self, file_id: &str) -> Result<ZipfSeries> {
        let token = self.credentials.authorize(&[Scope::DRIVE_READONLY]).await?;
        let data = self
            .drive_connector(&token)
            .download(&ItemId::new(file_id))
            .await?;

        Ok(ZipfSeries::from_json(&data)?)
    }

    fn drive_connector(&self, token: &AccessToken) -> GoogleDriveConnector {
        GoogleDriveConnector::new(
            Arc::clone(&self.config.http_client),
            token.secret().to_string(),
        )
        .with_base_url(self.drive_base_url.as_str())
    }

    fn tree_config(&self) -> TreeBuilderConfig {
        TreeBuilderConfig::default()
            .with_max_concurrency(self.config.traversal.max_concurrency)
            .with_max_depth(self.config.traversal.max_depth)
    }
}

fn credential_provider(config: &DashboardConfig) -> Arc<dyn CredentialProvider> {
    match &config.credentials {
        CredentialSettings::AccessToken(token) => {
            debug!("Using pre-issued access token");
            Arc::new(StaticTokenProvider::new(token.as_str()))
        }
        CredentialSettings::RefreshToken {
            client_id,
            client_secret,
            refresh_token,
            token_url,
        } => {
            debug!(client_id = %client_id, "Using refresh-token grant");
            let grant = RefreshTokenConfig::google(
                client_id.as_str(),
                client_secret.clone(),
                refresh_token.as_str(),
            )
            .with_token_url(token_url.as_str());
            Arc::new(RefreshTokenProvider::new(
                grant,
                Arc::clone(&config.http_client),
            ))
        }
    }
}
