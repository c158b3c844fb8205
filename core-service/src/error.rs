use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Google Drive error: {0}")]
    Drive(#[from] provider_google_drive::GoogleDriveError),

    #[error("Google Sheets error: {0}")]
    Sheets(#[from] provider_google_sheets::GoogleSheetsError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] core_analytics::AnalyticsError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
