//! Integration tests for engine configuration
//!
//! Covers parsing configuration documents the way the infra loader does and
//! the validation contract every named cache must satisfy.

use tidepool_domain::{CacheError, EngineConfig, Strategy};

/// Parse a TOML document describing two named caches
///
/// Scenario: a deployment bumps the `api` version and adds a `fonts` cache
#[test]
fn test_toml_document_parses_named_caches() {
    let doc = r#"
        [cleanup]
        interval_seconds = 600
        run_on_startup = false
        jitter = 0.1

        [caches.api]
        version = "v2"
        max_age_seconds = 900
        max_entries = 2
        network_timeout_seconds = 10
        default_strategy = "stale_while_revalidate"

        [caches.fonts]
        version = "v1"
        max_age_seconds = 86400
        max_entries = 20
        network_timeout_seconds = 5
    "#;

    let config: EngineConfig = toml::from_str(doc).unwrap();

    assert_eq!(config.caches.len(), 2);
    assert_eq!(config.caches["api"].version, "v2");
    assert_eq!(config.caches["api"].default_strategy, Some(Strategy::StaleWhileRevalidate));
    assert_eq!(config.caches["fonts"].default_strategy, None);
    assert_eq!(config.cleanup.interval_seconds, Some(600));
    assert!(!config.cleanup.run_on_startup);
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let doc = r#"
        [caches.api]
        version = "v1"
        max_age_seconds = 900
        max_entries = 2
        network_timeout_seconds = 10
        default_strategy = "cache-then-maybe"
    "#;

    assert!(toml::from_str::<EngineConfig>(doc).is_err());
}

/// Limits of zero parse fine but fail validation
#[test]
fn test_zero_limits_fail_validation() {
    let doc = r#"
        [caches.clinical]
        version = "v1"
        max_age_seconds = 0
        max_entries = 100
        network_timeout_seconds = 10
    "#;

    let config: EngineConfig = toml::from_str(doc).unwrap();
    match config.validate() {
        Err(CacheError::Config { cache, message }) => {
            assert_eq!(cache, "clinical");
            assert!(message.contains("max_age_seconds"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_default_config_round_trips_through_json() {
    let config = EngineConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
