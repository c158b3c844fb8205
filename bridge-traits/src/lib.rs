//! # Host Bridge Traits
//!
//! Abstraction traits the dashboard core needs from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and the
//! host-specific implementations. Each trait represents a capability the
//! core requires but which is implemented differently by the server build
//! (`bridge-desktop`) and by tests (mocks).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with bearer auth and retry
//!
//! [`execute_with_policy`](retry::execute_with_policy) runs a provider's own
//! [`RetryPolicy`](http::RetryPolicy) over any client.
//! - [`Clock`](time::Clock) - Time source for deterministic token-expiry tests
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to a host pipeline
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert library-specific errors into it and keep
//! the message actionable (status code, URL, cause).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared across concurrent traversal tasks.

pub mod error;
pub mod http;
pub mod retry;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use retry::{execute_with_policy, RetryFailure};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
