//! # Core Analytics
//!
//! Rank-frequency analysis of the corpus token dictionary.

pub mod error;
pub mod zipf;

pub use error::{AnalyticsError, Result};
pub use zipf::{parse_token_frequencies, TokenFrequency, ZipfSeries, TOP_TOKENS, ZIPF_EXPONENT};
