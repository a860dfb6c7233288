//! BME280 environmental sensor (temperature, humidity, pressure)

use super::simulation::{impl_simulated_source, SimulationCore};
use super::SensorRegistration;
use crate::protocol::{Environment, Measurements};
use rand::rngs::StdRng;

pub const KIND: &str = "bme280";

#[derive(Debug)]
pub struct Bme280 {
    core: SimulationCore,
}

impl Bme280 {
    pub fn new(registration: SensorRegistration, rng: StdRng) -> Self {
        Self {
            core: SimulationCore::new(registration, rng),
        }
    }

    fn measure(&mut self) -> Measurements {
        Measurements::Environment {
            environment: Environment {
                temperature: self.core.uniform(20.0, 26.0, 1),
                humidity: self.core.uniform(30.0, 60.0, 1),
                pressure: self.core.uniform(1000.0, 1030.0, 1),
            },
        }
    }
}

impl_simulated_source!(Bme280);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ReadingSource;
    use rand::SeedableRng;

    #[test]
    fn test_bme280_reading_ranges() {
        let mut sensor = Bme280::new(
            SensorRegistration::new(KIND, "bme280_01", "living_room"),
            StdRng::seed_from_u64(1),
        );

        for _ in 0..200 {
            let reading = sensor.produce_reading().unwrap();
            assert_eq!(reading.sensor_id, "bme280_01");
            assert_eq!(reading.location, "living_room");
            match reading.measurements {
                Measurements::Environment { environment } => {
                    assert!((20.0..=26.0).contains(&environment.temperature));
                    assert!((30.0..=60.0).contains(&environment.humidity));
                    assert!((1000.0..=1030.0).contains(&environment.pressure));
                }
                other => panic!("unexpected measurements: {other:?}"),
            }
        }
    }
}
