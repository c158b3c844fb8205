//! Rank-frequency series over a token-frequency dataset
//!
//! The dataset is a JSON object mapping each token to its occurrence count.
//! Counts are ranked in descending order (rank 1 is the most frequent token)
//! and compared against the ideal Zipf curve `C / r^s`, where `C` is the top
//! frequency.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{AnalyticsError, Result};

/// Exponent of the ideal curve
pub const ZIPF_EXPONENT: f64 = 1.0;

/// Number of leading tokens kept by name in a [`ZipfSeries`]
pub const TOP_TOKENS: usize = 10;

/// A token and its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenFrequency {
    pub token: String,
    pub count: u64,
}

/// Parse a `{ token: count }` JSON object.
///
/// Counts must be non-negative whole numbers; `3` and `3.0` are both
/// accepted. The result is ordered by count descending, ties broken by token
/// so the ranking is stable.
#[instrument(skip(data), fields(bytes = data.len()))]
pub fn parse_token_frequencies(data: &[u8]) -> Result<Vec<TokenFrequency>> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(data)?;

    let mut frequencies = object
        .into_iter()
        .map(|(token, value)| match whole_count(&value) {
            Some(count) => Ok(TokenFrequency { token, count }),
            None => Err(AnalyticsError::InvalidCount {
                token,
                value: value.to_string(),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.token.cmp(&b.token)));

    debug!(tokens = frequencies.len(), "Parsed token frequencies");
    Ok(frequencies)
}

fn whole_count(value: &serde_json::Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    let count = value.as_f64()?;
    // 2^64 itself is out of range; everything below it casts exactly
    (count >= 0.0 && count.fract() == 0.0 && count < u64::MAX as f64).then(|| count as u64)
}

/// Observed and ideal frequencies by rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipfSeries {
    /// Exponent `s` of the ideal curve
    pub exponent: f64,
    /// Constant `C` of the ideal curve (the top frequency)
    pub constant: f64,
    pub ranks: Vec<u64>,
    pub frequencies: Vec<u64>,
    pub ideal: Vec<f64>,
    /// Least-squares slope of log(frequency) against log(rank)
    pub fitted_slope: Option<f64>,
    pub total_count: u64,
    pub top_tokens: Vec<TokenFrequency>,
}

impl ZipfSeries {
    /// Build the series from frequencies already sorted by count descending.
    pub fn from_frequencies(frequencies: &[TokenFrequency]) -> Result<Self> {
        let counts: Vec<u64> = frequencies.iter().map(|f| f.count).collect();
        let mut series = Self::from_counts(counts)?;
        series.top_tokens = frequencies.iter().take(TOP_TOKENS).cloned().collect();
        Ok(series)
    }

    /// Build the series from raw counts in any order.
    pub fn from_counts(mut counts: Vec<u64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        counts.sort_unstable_by(|a, b| b.cmp(a));

        let constant = counts[0] as f64;
        let ranks: Vec<u64> = (1..=counts.len() as u64).collect();
        let ideal = ranks
            .iter()
            .map(|&rank| constant / (rank as f64).powf(ZIPF_EXPONENT))
            .collect();
        let fitted_slope = log_log_slope(&ranks, &counts);
        let total_count = counts
            .iter()
            .try_fold(0u64, |total, &count| total.checked_add(count))
            .ok_or(AnalyticsError::CountOverflow)?;

        Ok(Self {
            exponent: ZIPF_EXPONENT,
            constant,
            total_count,
            ranks,
            frequencies: counts,
            ideal,
            fitted_slope,
            top_tokens: Vec::new(),
        })
    }

    /// Parse a token-frequency JSON document and build its series.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let frequencies = parse_token_frequencies(data)?;
        Self::from_frequencies(&frequencies)
    }

    /// Distinct tokens in the dataset
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// Ordinary least squares over `(ln rank, ln frequency)`.
///
/// Zero counts have no logarithm and are left out. Fewer than two usable
/// points give `None`.
fn log_log_slope(ranks: &[u64], counts: &[u64]) -> Option<f64> {
    let points: Vec<(f64, f64)> = ranks
        .iter()
        .zip(counts)
        .filter(|(_, count)| **count > 0)
        .map(|(&rank, &count)| ((rank as f64).ln(), (count as f64).ln()))
        .collect();

    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), &(x, y)| (sx + x, sy + y, sxy + x * y, sxx + x * x),
    );

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sorts_by_count_then_token() {
        let parsed = parse_token_frequencies(br#"{"ca": 3, "ab": 3, "zz": 9, "k": 0}"#).unwrap();

        let order: Vec<_> = parsed.iter().map(|f| f.token.as_str()).collect();
        assert_eq!(order, vec!["zz", "ab", "ca", "k"]);
    }

    #[test]
    fn test_parse_rejects_negative_and_fractional_counts() {
        assert!(matches!(
            parse_token_frequencies(br#"{"a": -1}"#),
            Err(AnalyticsError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_token_frequencies(br#"{"a": 1.5}"#),
            Err(AnalyticsError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_token_frequencies(br#"{"a": "7"}"#),
            Err(AnalyticsError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_parse_accepts_whole_number_floats() {
        let parsed = parse_token_frequencies(br#"{"a": 3.0, "b": 7, "c": 0.0}"#).unwrap();

        let counts: Vec<_> = parsed.iter().map(|f| (f.token.as_str(), f.count)).collect();
        assert_eq!(counts, vec![("b", 7), ("a", 3), ("c", 0)]);

        assert!(matches!(
            parse_token_frequencies(br#"{"a": -2.0}"#),
            Err(AnalyticsError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_token_frequencies(br#"{"a": 1e30}"#),
            Err(AnalyticsError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let json = br#"{"a": 18446744073709551615, "b": 18446744073709551615}"#;

        assert!(matches!(
            ZipfSeries::from_json(json),
            Err(AnalyticsError::CountOverflow)
        ));
    }

    #[test]
    fn test_single_max_count_is_accepted() {
        let series = ZipfSeries::from_counts(vec![u64::MAX, 0]).unwrap();

        assert_eq!(series.total_count, u64::MAX);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_token_frequencies(b"[1, 2, 3]"),
            Err(AnalyticsError::Parse(_))
        ));
        assert!(matches!(
            parse_token_frequencies(b"not json"),
            Err(AnalyticsError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_dataset() {
        assert!(matches!(
            ZipfSeries::from_json(b"{}"),
            Err(AnalyticsError::EmptyDataset)
        ));
    }

    #[test]
    fn test_ideal_curve_uses_top_frequency() {
        let series = ZipfSeries::from_counts(vec![10, 40, 20]).unwrap();

        assert_eq!(series.ranks, vec![1, 2, 3]);
        assert_eq!(series.frequencies, vec![40, 20, 10]);
        assert_eq!(series.constant, 40.0);
        assert_eq!(series.ideal[0], 40.0);
        assert_eq!(series.ideal[1], 20.0);
        assert!((series.ideal[2] - 40.0 / 3.0).abs() < 1e-12);
        assert_eq!(series.total_count, 70);
    }

    #[test]
    fn test_perfect_zipf_fits_slope_of_minus_one() {
        let series = ZipfSeries::from_counts(vec![60, 30, 20, 15, 12, 10]).unwrap();

        let slope = series.fitted_slope.unwrap();
        assert!((slope + 1.0).abs() < 1e-9, "slope was {}", slope);
    }

    #[test]
    fn test_slope_needs_two_nonzero_points() {
        assert_eq!(ZipfSeries::from_counts(vec![5]).unwrap().fitted_slope, None);
        assert_eq!(ZipfSeries::from_counts(vec![5, 0, 0]).unwrap().fitted_slope, None);
    }

    #[test]
    fn test_top_tokens_are_kept_by_name() {
        let json = br#"{"the": 50, "of": 20, "and": 20, "a": 5}"#;

        let series = ZipfSeries::from_json(json).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.top_tokens[0].token, "the");
        assert_eq!(series.top_tokens[1].token, "and");
        assert_eq!(series.top_tokens[2].token, "of");
    }
}
