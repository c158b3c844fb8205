//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `provider-google-drive`, `core-analytics`). Host
//! applications can depend on `drive-dashboard-workspace` and enable the
//! documented features without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "drive-tree")]
pub use provider_google_drive as drive;

#[cfg(feature = "analytics")]
pub use core_analytics as analytics;
