//! SCD41 photoacoustic CO₂ sensor

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::{CarbonDioxide, Measurements};
use rand::rngs::StdRng;

pub const KIND: &str = "scd41";

#[derive(Debug)]
pub struct Scd41 {
    core: SimulationCore,
}

impl Scd41 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::CarbonDioxide {
            co2: CarbonDioxide {
                ppm: self.core.integer(380, 800),
                temperature: self.core.uniform(20.0, 26.0, 1),
                humidity: self.core.uniform(30.0, 60.0, 1),
            },
        }
    }
}

impl_simulated_source!(Scd41);
