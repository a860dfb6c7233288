//! Reading sources
//!
//! A reading source produces one [`Reading`] per poll. The runtime treats
//! every source through the [`ReadingSource`] trait and never special-cases a
//! sensor kind; the built-in kinds are random-value simulators of common
//! environmental sensors, created by name through the [`SensorRegistry`].

pub mod bme280;
pub mod ds18b20;
pub mod ens160;
pub mod pms5003;
pub mod registry;
pub mod scd41;
pub mod sen0441;
pub mod simulation;

use crate::protocol::Reading;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bme280::Bme280;
pub use ds18b20::Ds18b20;
pub use ens160::Ens160;
pub use pms5003::Pms5003;
pub use registry::{SensorRegistry, SourceConstructor};
pub use scd41::Scd41;
pub use sen0441::Sen0441;
pub use simulation::SimulationCore;

/// Capability shared by every data source polled by the publisher
///
/// `produce_reading` must not block. Simulated sources never fail; the
/// `Result` lets the publisher isolate a misbehaving source without
/// affecting its siblings.
pub trait ReadingSource: Send {
    /// Sensor kind name, used as the middle topic level
    fn kind(&self) -> &str;

    /// Identity of this configured instance, used as the last topic level
    fn identity(&self) -> &str;

    /// Location tag copied into every reading
    fn location(&self) -> &str;

    /// Produce one reading
    fn produce_reading(&mut self) -> Result<Reading, SourceError>;
}

/// Binds a sensor kind to an identity, a location and an enabled flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRegistration {
    pub kind: String,
    pub id: String,
    pub location: String,
    pub enabled: bool,
}

impl SensorRegistration {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            location: location.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unknown sensor kind: {0}")]
    UnknownKind(String),
    #[error("Sensor {sensor_id} failed to produce a reading: {message}")]
    ReadFailed { sensor_id: String, message: String },
}

impl SourceError {
    pub fn read_failed(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            sensor_id: sensor_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_builder() {
        let registration = SensorRegistration::new("bme280", "bme280_01", "living_room");
        assert!(registration.enabled);
        assert!(!registration.disabled().enabled);
    }

    #[test]
    fn test_source_error_display() {
        let error = SourceError::read_failed("scd41_01", "i2c bus timeout");
        assert_eq!(
            error.to_string(),
            "Sensor scd41_01 failed to produce a reading: i2c bus timeout"
        );
        assert_eq!(
            SourceError::UnknownKind("bmp180".to_string()).to_string(),
            "Unknown sensor kind: bmp180"
        );
    }
}
