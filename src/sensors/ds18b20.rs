//! DS18B20 one-wire temperature probe

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::Measurements;
use rand::rngs::StdRng;

pub const KIND: &str = "ds18b20";

#[derive(Debug)]
pub struct Ds18b20 {
    core: SimulationCore,
}

impl Ds18b20 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::Temperature {
            temperature: self.core.uniform(15.0, 30.0, 1),
        }
    }
}

impl_simulated_source!(Ds18b20);
