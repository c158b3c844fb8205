//! Error types for Google Drive provider

use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Authentication failed or token is invalid
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Shared drive not found or not visible to the caller
    #[error("Shared drive not found: {collection_id}")]
    CollectionNotFound { collection_id: String },

    /// No folder named after the shared drive exists inside it
    #[error("Root folder '{name}' not found in shared drive {collection_id}")]
    RootNotFound { collection_id: String, name: String },

    /// The remote hierarchy loops back on itself or nests deeper than allowed
    #[error("Unbounded recursion at item {item_id} (depth {depth})")]
    UnboundedRecursion { item_id: String, depth: usize },

    /// The server handed back a continuation token it had already issued
    #[error("Pagination loop: continuation token repeated after {pages} pages")]
    PaginationLoop { pages: usize },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Internal invariant broken (closed semaphore and similar)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

impl GoogleDriveError {
    /// Whether the error came from talking to the remote API (as opposed to
    /// a structural problem with the hierarchy itself).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GoogleDriveError::AuthenticationFailed(_)
                | GoogleDriveError::ApiError { .. }
                | GoogleDriveError::RateLimitExceeded { .. }
                | GoogleDriveError::PaginationLoop { .. }
                | GoogleDriveError::ParseError(_)
                | GoogleDriveError::NetworkError(_)
                | GoogleDriveError::BridgeError(_)
        )
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for bridge_traits::error::BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::BridgeError(e) => e,
            GoogleDriveError::NetworkError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Network error: {}",
                    msg
                ))
            }
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}
