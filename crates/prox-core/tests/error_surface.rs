use prox_core::errors::{
    ErrorInfo, ProxError, INVALID_COORDINATE, MALFORMED_DATE, MISSING_REQUIRED_COLUMN,
};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("file", "seoul_cafe.csv")
        .with_context("row", "7")
}

#[test]
fn date_error_surface() {
    let err = ProxError::Date(sample_info(MALFORMED_DATE, "bad permit date"));
    assert_eq!(err.code(), MALFORMED_DATE);
    assert!(err.info().context.contains_key("row"));
}

#[test]
fn schema_error_surface() {
    let err = ProxError::Schema(
        sample_info(MISSING_REQUIRED_COLUMN, "missing").with_hint("check the header row"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("schema error: missing (code: missing_required_column)"));
    assert!(rendered.contains("file=seoul_cafe.csv"));
    assert!(rendered.ends_with("| hint: check the header row"));
}

#[test]
fn record_error_surface() {
    let err = ProxError::Record(sample_info(INVALID_COORDINATE, "x is NaN"));
    assert_eq!(err.info().code, INVALID_COORDINATE);
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = ProxError::Config(ErrorInfo::new("config_horizon", "bad horizon"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Config");
    assert_eq!(json["detail"]["code"], "config_horizon");
    let back: ProxError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}
