//! Crate-level error type used by the binary
//!
//! Each module owns its error enum; [`SimulatorError`] gathers them so the
//! entry point can report any failure and pick an exit code.

use crate::config::ConfigError;
use crate::sensors::SourceError;
use crate::server::LifecycleError;
use crate::transport::mqtt::MqttError;
use thiserror::Error;

/// Main error type for simulator operations
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] MqttError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SourceError),

    #[error("Server error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Failed to encode output: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulatorError {
    pub fn encode<E: std::fmt::Display>(error: E) -> Self {
        Self::Encode(error.to_string())
    }

    /// Human-readable chain: this error followed by each `source()`
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mqtt::ConnectionState;

    #[test]
    fn test_from_config_error() {
        let error: SimulatorError = ConfigError::DuplicateSensorId("bme280_01".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Configuration error: Duplicate sensor id: bme280_01"
        );
    }

    #[test]
    fn test_report_includes_source_chain() {
        let mqtt = MqttError::NotConnected {
            state: ConnectionState::Disconnected("connection refused".to_string()),
        };
        let error: SimulatorError =
            LifecycleError::ConnectionFailed(Box::new(mqtt)).into();

        let report = error.report();
        assert!(report.starts_with("Server error: Failed to connect to MQTT broker"));
        assert!(report.contains("connection refused"));
    }

    #[test]
    fn test_encode_constructor() {
        let error = SimulatorError::encode("bad float");
        assert_eq!(error.to_string(), "Failed to encode output: bad float");
    }
}
