//! Shared machinery for simulated sensors
//!
//! Each simulated sensor owns a [`SimulationCore`] holding its registration,
//! its random generator and the last timestamp it emitted.

use super::SensorRegistration;
use crate::protocol::{Measurements, Reading};
use chrono::{DateTime, SubsecRound, Utc};
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Debug)]
pub struct SimulationCore {
    registration: SensorRegistration,
    rng: StdRng,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SimulationCore {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            registration,
            rng,
            last_timestamp: None,
        }
    }

    pub fn registration(&self) -> &SensorRegistration {
        &self.registration
    }

    /// Current time at second precision, never earlier than the previous one
    pub fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(0);
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    /// Uniform float in `[low, high]`, rounded to `decimals` places
    pub fn uniform(&mut self, low: f64, high: f64, decimals: i32) -> f64 {
        round_to(self.rng.gen_range(low..=high), decimals).clamp(low, high)
    }

    /// Uniform integer in `[low, high]`
    pub fn integer(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    /// Wrap measurements into a reading stamped with this sensor's metadata
    pub fn reading(&mut self, measurements: Measurements) -> Reading {
        let timestamp = self.next_timestamp();
        Reading::new(
            self.registration.id.clone(),
            self.registration.location.clone(),
            timestamp,
            measurements,
        )
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Implement [`ReadingSource`](super::ReadingSource) for a simulated sensor
/// with a `core: SimulationCore` field and a `measure(&mut self)` method.
macro_rules! impl_simulated_source {
    ($sensor:ty) => {
        impl $crate::sensors::ReadingSource for $sensor {
            fn kind(&self) -> &str {
                &self.core.registration().kind
            }

            fn identity(&self) -> &str {
                &self.core.registration().id
            }

            fn location(&self) -> &str {
                &self.core.registration().location
            }

            fn produce_reading(
                &mut self,
            ) -> Result<$crate::protocol::Reading, $crate::sensors::SourceError> {
                let measurements = self.measure();
                Ok(self.core.reading(measurements))
            }
        }
    };
}

pub(crate) use impl_simulated_source;
