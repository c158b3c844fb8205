use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Invalid credential configuration: {0}")]
    InvalidConfig(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("HTTP error: {0}")]
    Http(#[from] bridge_traits::error::BridgeError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
