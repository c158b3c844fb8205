//! Error types for Google Sheets provider

use thiserror::Error;

/// Google Sheets provider errors
#[derive(Error, Debug)]
pub enum GoogleSheetsError {
    /// Authentication failed or token is invalid
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Sheets API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Spreadsheet not found: {sheet_id}")]
    SpreadsheetNotFound { sheet_id: String },

    /// The spreadsheet has no worksheets at all
    #[error("Spreadsheet {sheet_id} has no worksheets")]
    NoWorksheets { sheet_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Google Sheets operations
pub type Result<T> = std::result::Result<T, GoogleSheetsError>;

impl From<GoogleSheetsError> for bridge_traits::error::BridgeError {
    fn from(error: GoogleSheetsError) -> Self {
        match error {
            GoogleSheetsError::BridgeError(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GoogleSheetsError::NoWorksheets {
            sheet_id: "abc".to_string(),
        };
        assert_eq!(error.to_string(), "Spreadsheet abc has no worksheets");
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: bridge_traits::error::BridgeError =
            GoogleSheetsError::ParseError("bad".to_string()).into();

        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::OperationFailed(_)
        ));
    }
}
