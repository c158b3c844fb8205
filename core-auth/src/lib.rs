//! # Authentication Module
//!
//! Credential providers and the operator password gate.
//!
//! ## Overview
//!
//! API connectors never see how a token was obtained: they ask a
//! [`CredentialProvider`] for the scopes they need and receive an
//! [`AccessToken`].
//!
//! ## Features
//!
//! - Pre-issued bearer tokens (`StaticTokenProvider`)
//! - OAuth 2.0 refresh-token grant with caching and retry (`RefreshTokenProvider`)
//! - Redacted `Debug` output for every secret-bearing type
//! - Constant-time operator password verification (`OperatorGate`)

pub mod error;
pub mod oauth;
pub mod operator;
pub mod provider;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{RefreshTokenConfig, RefreshTokenProvider, GOOGLE_TOKEN_URL};
pub use operator::OperatorGate;
pub use provider::{CredentialProvider, StaticTokenProvider};
pub use types::{AccessToken, Scope};
