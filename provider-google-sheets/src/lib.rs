//! # Google Sheets Provider
//!
//! Reads the most recent row of a statistics spreadsheet through the
//! Sheets API v4.
//!
//! The first worksheet's header row names the fields; the last non-blank
//! row below it becomes a [`SheetRecord`].

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{GoogleSheetsConnector, SHEETS_API_BASE};
pub use error::{GoogleSheetsError, Result};
pub use types::{SheetProperties, SheetRecord, SpreadsheetMetadata, ValueRange};
