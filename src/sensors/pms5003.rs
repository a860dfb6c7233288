//! PMS5003 particulate matter sensor

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::{Measurements, Particulates};
use rand::rngs::StdRng;

pub const KIND: &str = "pms5003";

#[derive(Debug)]
pub struct Pms5003 {
    core: SimulationCore,
}

impl Pms5003 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::Particulates {
            pm: Particulates {
                pm1_0: self.core.uniform(5.0, 20.0, 1),
                pm2_5: self.core.uniform(15.0, 35.0, 1),
                pm10: self.core.uniform(30.0, 60.0, 1),
                particles_0_3um: self.core.integer(5000, 15000),
                particles_0_5um: self.core.integer(2000, 8000),
                particles_1_0um: self.core.integer(500, 2000),
                particles_2_5um: self.core.integer(100, 800),
                particles_5_0um: self.core.integer(20, 100),
                particles_10um: self.core.integer(5, 30),
            },
        }
    }
}

impl_simulated_source!(Pms5003);
