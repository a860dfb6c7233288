//! Tests for logging configuration
//!
//! Covers the pure settings resolution plus the one-shot global subscriber
//! installation.

use sensor_sim::observability::logging::{init_logging, LogFormat, LogSettings};
use std::collections::HashMap;
use tracing::Level;

fn settings_from(pairs: &[(&str, &str)]) -> LogSettings {
    let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
    LogSettings::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
}

#[test]
fn test_log_format_parse_invalid_defaults_to_compact() {
    assert_eq!(LogFormat::parse("invalid"), LogFormat::Compact);
    assert_eq!(LogFormat::parse(""), LogFormat::Compact);
    assert_eq!(LogFormat::parse("  JSON \n"), LogFormat::Json);
}

#[test]
fn test_verbosity_raises_level() {
    let base = settings_from(&[]);

    assert_eq!(base.clone().with_verbosity(0).level, Level::INFO);
    assert_eq!(base.clone().with_verbosity(1).level, Level::DEBUG);
    assert_eq!(base.with_verbosity(3).level, Level::TRACE);
}

#[test]
fn test_verbosity_never_lowers_configured_level() {
    let settings = settings_from(&[("LOG_LEVEL", "trace")]).with_verbosity(1);

    assert_eq!(settings.level, Level::TRACE);
}

#[test]
fn test_filter_quiets_dependencies() {
    let settings = settings_from(&[("LOG_LEVEL", "debug")]);

    assert_eq!(
        settings.filter_directives(),
        "DEBUG,rumqttc=warn,tokio=warn"
    );
}

#[test]
fn test_blank_rust_log_is_ignored() {
    let settings = settings_from(&[("RUST_LOG", "   ")]);

    assert_eq!(settings.filter_override, None);
}

#[test]
fn test_subscriber_installs_once() {
    let settings = settings_from(&[("LOG_FORMAT", "json")]);

    assert!(init_logging(&settings).is_ok());
    assert!(init_logging(&settings).is_err());
}
