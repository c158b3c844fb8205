use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth 2.0 scopes the dashboard asks for.
///
/// # Examples
///
/// ```
/// use core_auth::Scope;
///
/// assert!(Scope::DRIVE_READONLY.ends_with("drive.readonly"));
/// ```
pub struct Scope;

impl Scope {
    /// Read-only access to Drive files, including shared drives
    pub const DRIVE_READONLY: &'static str = "https://www.googleapis.com/auth/drive.readonly";

    /// Read-only access to spreadsheets
    pub const SPREADSHEETS_READONLY: &'static str =
        "https://www.googleapis.com/auth/spreadsheets.readonly";
}

/// Seconds before expiry at which a cached token is considered stale
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 300;

/// Bearer access token handed to API connectors.
///
/// # Security
///
/// The `Debug` implementation redacts the token value.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let token = AccessToken::new("ya29.a0...").with_expiry(now + Duration::minutes(10));
///
/// assert!(!token.is_expired_at(now));
/// assert!(format!("{:?}", token).contains("[REDACTED]"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    token: String,
    /// When the token stops being accepted; `None` if unknown
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes the token was requested with
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    /// Token that expires `expires_in` seconds after `now`.
    pub fn expiring_in(token: impl Into<String>, now: DateTime<Utc>, expires_in: i64) -> Self {
        Self::new(token).with_expiry(now + Duration::seconds(expires_in))
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The raw bearer value. Never log this.
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Expired, or expiring within the default five minute buffer.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired_with_buffer(now, DEFAULT_EXPIRY_BUFFER_SECS)
    }

    pub fn is_expired_with_buffer(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::seconds(buffer_seconds),
            None => false,
        }
    }

    /// Time remaining until expiry; `None` if expired or unknown.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .filter(|expires_at| now < *expires_at)
            .map(|expires_at| expires_at - now)
    }

    /// Whether every scope in `requested` was granted to this token.
    pub fn covers(&self, requested: &[&str]) -> bool {
        requested
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
