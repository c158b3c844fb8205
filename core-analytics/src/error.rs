use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Token dataset contains no tokens")]
    EmptyDataset,

    #[error("Failed to parse token dataset: {0}")]
    Parse(String),

    #[error("Invalid count for token {token:?}: {value}")]
    InvalidCount { token: String, value: String },

    #[error("Token counts overflow a 64-bit total")]
    CountOverflow,
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Parse(err.to_string())
    }
}
