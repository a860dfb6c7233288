//! Structured logging using the tracing crate
//!
//! Provides contextual, machine-readable logging with span macros for the
//! broker session, the server lifecycle and each publishing tick.
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: ERROR, WARN, INFO, DEBUG or TRACE (default INFO)
//! - `LOG_FORMAT`: `json`, `pretty` or `compact` (default compact)
//! - `LOG_SPANS`: `true` to log span open/close events (default false)
//! - `RUST_LOG`: full filter override, env_logger syntax
//!
//! ```bash
//! LOG_FORMAT=json LOG_LEVEL=INFO sensor-sim run
//! LOG_FORMAT=pretty LOG_LEVEL=DEBUG sensor-sim -c lab.toml run
//! ```

use std::env;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation
    Json,
    /// Multi-line with colors, for development
    Pretty,
    /// Single line with colors, for terminals
    Compact,
}

impl LogFormat {
    /// Parse log format from string, falling back to compact
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

/// Parse a level name, falling back to INFO
pub fn parse_level(s: &str) -> Level {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" | "WARNING" => Level::WARN,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: Level,
    pub format: LogFormat,
    pub include_spans: bool,
    /// Full filter from `RUST_LOG`, replaces the level-based filter
    pub filter_override: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            include_spans: false,
            filter_override: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: lookup("LOG_LEVEL")
                .map(|v| parse_level(&v))
                .unwrap_or(Level::INFO),
            format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Compact),
            include_spans: lookup("LOG_SPANS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            filter_override: lookup("RUST_LOG").filter(|v| !v.trim().is_empty()),
        }
    }

    /// Raise the level by `-v` count: one for DEBUG, two or more for TRACE
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let requested = match verbose {
            0 => return self,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        // tracing orders levels by verbosity: TRACE > DEBUG > INFO
        if requested > self.level {
            self.level = requested;
        }
        self
    }

    /// Filter directives: the chosen level with noisy dependencies held at WARN
    pub fn filter_directives(&self) -> String {
        match &self.filter_override {
            Some(filter) => filter.clone(),
            None => format!("{},rumqttc=warn,tokio=warn", self.level),
        }
    }
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(settings.filter_directives())
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_string()));

    let span_events = if settings.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    match settings.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_span_events(span_events))
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_span_events(span_events),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(true)
                    .with_target(false)
                    .with_span_events(span_events),
            )
            .try_init(),
    }
}

/// Initialize logging from environment variables plus CLI verbosity
pub fn init_default_logging(verbose: u8) {
    let settings = LogSettings::from_env().with_verbosity(verbose);
    if let Err(e) = init_logging(&settings) {
        eprintln!("Logging already initialized: {e}");
    }
}

/// Create an MQTT operation span
#[macro_export]
macro_rules! mqtt_span {
    ($($field:tt)*) => {
        tracing::info_span!("mqtt_operation", $($field)*)
    };
}

/// Create a lifecycle event span
#[macro_export]
macro_rules! lifecycle_span {
    ($($field:tt)*) => {
        tracing::info_span!("lifecycle_event", $($field)*)
    };
}

/// Create a publishing tick span
#[macro_export]
macro_rules! tick_span {
    ($($field:tt)*) => {
        tracing::debug_span!("publish_tick", $($field)*)
    };
}

pub use {lifecycle_span, mqtt_span, tick_span};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> LogSettings {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        LogSettings::from_lookup(|name| map.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Pretty "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Compact);
        assert_eq!(LogFormat::parse(""), LogFormat::Compact);
    }

    #[test]
    fn test_parse_level() {
        let test_cases = vec![
            ("ERROR", Level::ERROR),
            ("warn", Level::WARN),
            ("Warning", Level::WARN),
            ("info", Level::INFO),
            ("DEBUG", Level::DEBUG),
            ("trace", Level::TRACE),
            ("loud", Level::INFO),
        ];

        for (input, expected) in test_cases {
            assert_eq!(parse_level(input), expected, "Failed for input: {input}");
        }
    }

    #[test]
    fn test_settings_defaults_without_env() {
        assert_eq!(settings_from(&[]), LogSettings::default());
    }

    #[test]
    fn test_settings_from_env_values() {
        let settings = settings_from(&[
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
            ("LOG_SPANS", "TRUE"),
        ]);

        assert_eq!(settings.level, Level::DEBUG);
        assert_eq!(settings.format, LogFormat::Json);
        assert!(settings.include_spans);
        assert_eq!(settings.filter_directives(), "DEBUG,rumqttc=warn,tokio=warn");
    }

    #[test]
    fn test_log_spans_only_true_enables() {
        for value in ["false", "", "yes", "1"] {
            assert!(!settings_from(&[("LOG_SPANS", value)]).include_spans, "{value}");
        }
    }

    #[test]
    fn test_rust_log_overrides_filter() {
        let settings = settings_from(&[("RUST_LOG", "sensor_sim=trace"), ("LOG_LEVEL", "error")]);
        assert_eq!(settings.filter_directives(), "sensor_sim=trace");

        let settings = settings_from(&[("RUST_LOG", "  ")]);
        assert_eq!(settings.filter_override, None);
    }

    #[test]
    fn test_verbosity_only_raises_level() {
        assert_eq!(LogSettings::default().with_verbosity(0).level, Level::INFO);
        assert_eq!(LogSettings::default().with_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogSettings::default().with_verbosity(3).level, Level::TRACE);

        let trace = LogSettings {
            level: Level::TRACE,
            ..LogSettings::default()
        };
        assert_eq!(trace.with_verbosity(1).level, Level::TRACE);
    }
}
