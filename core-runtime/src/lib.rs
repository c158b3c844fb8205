//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the drive dashboard:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the validated configuration
//! every service is built from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CredentialSettings, DashboardConfig, DashboardConfigBuilder, TraversalSettings};
pub use error::{Error, Result};
