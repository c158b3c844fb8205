use core_analytics::{AnalyticsError, ZipfSeries, TOP_TOKENS};

fn dataset(tokens: usize) -> Vec<u8> {
    let entries: Vec<String> = (1..=tokens)
        .map(|rank| format!("\"tok{:03}\": {}", rank, 1200 / rank))
        .collect();
    format!("{{{}}}", entries.join(", ")).into_bytes()
}

#[test]
fn test_series_from_dictionary_document() {
    let series = ZipfSeries::from_json(&dataset(40)).unwrap();

    assert_eq!(series.len(), 40);
    assert_eq!(series.frequencies[0], 1200);
    assert_eq!(series.top_tokens.len(), TOP_TOKENS);
    assert_eq!(series.top_tokens[0].token, "tok001");
    assert!(series
        .frequencies
        .windows(2)
        .all(|pair| pair[0] >= pair[1]));

    let slope = series.fitted_slope.unwrap();
    assert!(slope < -0.9 && slope > -1.1, "slope was {}", slope);
}

#[test]
fn test_series_serializes_for_charting() {
    let series = ZipfSeries::from_json(br#"{"a": 4, "b": 2}"#).unwrap();

    let json = serde_json::to_value(&series).unwrap();

    assert_eq!(json["exponent"], 1.0);
    assert_eq!(json["ranks"], serde_json::json!([1, 2]));
    assert_eq!(json["frequencies"], serde_json::json!([4, 2]));
    assert_eq!(json["ideal"], serde_json::json!([4.0, 2.0]));
    assert_eq!(json["top_tokens"][0]["token"], "a");
}

#[test]
fn test_empty_document_is_rejected() {
    let err = ZipfSeries::from_json(b"{}").unwrap_err();

    assert!(matches!(err, AnalyticsError::EmptyDataset));
    assert_eq!(err.to_string(), "Token dataset contains no tokens");
}
