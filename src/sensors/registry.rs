//! Sensor kind registry
//!
//! Maps a kind name to a constructor so the runtime can build its active
//! source set from configuration without knowing any concrete sensor type.

use super::{
    bme280, ds18b20, ens160, pms5003, scd41, sen0441, Bme280, Ds18b20, Ens160, Pms5003,
    ReadingSource, Scd41, SensorRegistration, Sen0441, SourceError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Builds a reading source for one registration
pub type SourceConstructor =
    Box<dyn Fn(SensorRegistration, StdRng) -> Box<dyn ReadingSource> + Send + Sync>;

pub struct SensorRegistry {
    constructors: BTreeMap<String, SourceConstructor>,
}

impl SensorRegistry {
    /// Empty registry, no kinds known
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with every simulated sensor kind
    pub fn with_builtin_sensors() -> Self {
        let mut registry = Self::new();
        registry.register(pms5003::KIND, |reg, rng| Box::new(Pms5003::new(reg, rng)));
        registry.register(ens160::KIND, |reg, rng| Box::new(Ens160::new(reg, rng)));
        registry.register(scd41::KIND, |reg, rng| Box::new(Scd41::new(reg, rng)));
        registry.register(sen0441::KIND, |reg, rng| Box::new(Sen0441::new(reg, rng)));
        registry.register(bme280::KIND, |reg, rng| Box::new(Bme280::new(reg, rng)));
        registry.register(ds18b20::KIND, |reg, rng| Box::new(Ds18b20::new(reg, rng)));
        registry
    }

    /// Register (or replace) the constructor for a kind
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(SensorRegistration, StdRng) -> Box<dyn ReadingSource> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Known kind names in sorted order
    pub fn kinds(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Create a single source regardless of its enabled flag
    pub fn create(
        &self,
        registration: SensorRegistration,
        rng: StdRng,
    ) -> Result<Box<dyn ReadingSource>, SourceError> {
        let constructor = self
            .constructors
            .get(&registration.kind)
            .ok_or_else(|| SourceError::UnknownKind(registration.kind.clone()))?;
        Ok(constructor(registration, rng))
    }

    /// Build the enabled sources in registration order
    ///
    /// With a seed, source `i` gets `StdRng::seed_from_u64(seed + i)` so runs are
    /// reproducible; without one every source is seeded from OS entropy.
    pub fn build_active(
        &self,
        registrations: &[SensorRegistration],
        seed: Option<u64>,
    ) -> Result<Vec<Box<dyn ReadingSource>>, SourceError> {
        let mut sources = Vec::with_capacity(registrations.len());

        for (index, registration) in registrations.iter().enumerate() {
            if !registration.enabled {
                info!(
                    sensor_kind = %registration.kind,
                    sensor_id = %registration.id,
                    "Sensor {} is disabled",
                    registration.kind
                );
                continue;
            }

            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };

            let source = self.create(registration.clone(), rng)?;
            info!(
                sensor_kind = %registration.kind,
                sensor_id = %registration.id,
                location = %registration.location,
                "Initialized {} at {}",
                registration.kind,
                registration.location
            );
            sources.push(source);
        }

        debug!(active = sources.len(), "Active sensor set built");
        Ok(sources)
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::with_builtin_sensors()
    }
}

impl fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
