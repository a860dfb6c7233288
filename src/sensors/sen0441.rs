//! SEN0441 formaldehyde sensor

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::{Formaldehyde, Measurements};
use rand::rngs::StdRng;

pub const KIND: &str = "sen0441";

#[derive(Debug)]
pub struct Sen0441 {
    core: SimulationCore,
}

impl Sen0441 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::Formaldehyde {
            hcho: Formaldehyde {
                // HCHO is reported with two decimals
                ppm: self.core.uniform(0.01, 0.1, 2),
                temperature: self.core.uniform(20.0, 26.0, 1),
                humidity: self.core.uniform(30.0, 60.0, 1),
            },
        }
    }
}

impl_simulated_source!(Sen0441);
