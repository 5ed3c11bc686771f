//! Integration tests for `tidepool_common::error`.
//!
//! These suites validate classification and display contracts so downstream
//! crates can rely on consistent failure semantics.

use std::time::Duration;

use tidepool_common::error::{CommonError, ErrorClassification, ErrorSeverity};

/// Validates that `CommonError` classification surfaces the expected
/// retryable, severity, and criticality combinations for each variant.
///
/// Assertions:
/// - Confirms `err.is_retryable()` equals `retryable`.
/// - Confirms `err.severity()` equals `severity`.
/// - Confirms `err.is_critical()` equals `critical`.
#[test]
fn classification_matrix_matches_expected_contract() {
    let cases = vec![
        (CommonError::config("missing cache name"), false, ErrorSeverity::Error, false),
        (CommonError::serialization("invalid JSON"), false, ErrorSeverity::Error, false),
        (CommonError::persistence("disk full"), false, ErrorSeverity::Error, false),
        (
            CommonError::timeout("scheduler shutdown", Duration::from_secs(5)),
            true,
            ErrorSeverity::Warning,
            false,
        ),
        (CommonError::backend("origin", "502", true), true, ErrorSeverity::Error, false),
        (CommonError::backend("origin", "404", false), false, ErrorSeverity::Error, false),
        (CommonError::validation("max_entries", "must be > 0"), false, ErrorSeverity::Error, false),
        (CommonError::not_found_with_id("cache", "fonts"), false, ErrorSeverity::Info, false),
        (CommonError::internal("task panicked"), false, ErrorSeverity::Critical, true),
        (
            CommonError::task_cancelled_with_reason("cleanup", "shutdown"),
            false,
            ErrorSeverity::Info,
            false,
        ),
    ];

    for (err, retryable, severity, critical) in cases {
        assert_eq!(err.is_retryable(), retryable, "retryable mismatch for {err}");
        assert_eq!(err.severity(), severity, "severity mismatch for {err}");
        assert_eq!(err.is_critical(), critical, "critical mismatch for {err}");
        assert_eq!(err.retry_after(), None);
    }
}

#[test]
fn display_includes_context_fields() {
    let err = CommonError::config_field("caches.api.version", "must not be empty");
    assert_eq!(
        err.to_string(),
        "Configuration error in field 'caches.api.version': must not be empty"
    );

    let err = CommonError::validation_with_value("max_age_seconds", "must be > 0", "0");
    assert!(err.to_string().contains("(value: '0')"));

    let err = CommonError::internal_with_context("join failed", "cleanup_scheduler");
    assert_eq!(err.to_string(), "Internal error in 'cleanup_scheduler': join failed");
}

/// Validates conversions from library errors land in the right variants.
///
/// Assertions:
/// - Ensures JSON and TOML parse failures map to `Serialization`.
/// - Ensures I/O failures map to `Persistence`.
#[test]
fn library_errors_convert_into_common_error() {
    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert_eq!(CommonError::from(json).error_type_name(), "serialization");

    let toml = toml::from_str::<toml::Value>("= broken").unwrap_err();
    assert_eq!(CommonError::from(toml).error_type_name(), "serialization");

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    assert_eq!(CommonError::from(io).error_type_name(), "persistence");
}

#[test]
fn severity_orders_by_urgency() {
    assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
    assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
    assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
}
