//! ENS160 indoor air quality sensor

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::{AirQuality, Measurements};
use rand::rngs::StdRng;

pub const KIND: &str = "ens160";

#[derive(Debug)]
pub struct Ens160 {
    core: SimulationCore,
}

impl Ens160 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::AirQuality {
            iaq: AirQuality {
                voc_index: self.core.integer(20, 100),
                eco2: self.core.integer(400, 1000),
                temperature: self.core.uniform(20.0, 26.0, 1),
                humidity: self.core.uniform(30.0, 60.0, 1),
            },
        }
    }
}

impl_simulated_source!(Ens160);
