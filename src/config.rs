//! Configuration for the sensor simulator
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults (six sensors, `localhost:1883`, 5 s interval)
//! 2. A TOML file (`[mqtt]`, `[runtime]`, `[[sensors]]`)
//! 3. Environment variables, after an optional `.env` file is loaded
//!
//! | Variable | Field |
//! |---|---|
//! | `MQTT_BROKER` | `mqtt.broker` |
//! | `MQTT_PORT` | `mqtt.port` |
//! | `MQTT_USER` | `mqtt.username` |
//! | `MQTT_PASSWORD` | `mqtt.password` |
//! | `MQTT_BASE_TOPIC` | `mqtt.base_topic` |
//! | `SENSOR_READ_INTERVAL` | `runtime.interval_secs` |

use crate::protocol::{validate_base_topic, validate_topic_segment, ValidationError};
use crate::sensors::SensorRegistration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const ENV_BROKER: &str = "MQTT_BROKER";
pub const ENV_PORT: &str = "MQTT_PORT";
pub const ENV_USER: &str = "MQTT_USER";
pub const ENV_PASSWORD: &str = "MQTT_PASSWORD";
pub const ENV_BASE_TOPIC: &str = "MQTT_BASE_TOPIC";
pub const ENV_INTERVAL: &str = "SENSOR_READ_INTERVAL";

/// Files searched, in order, when no path is given on the command line
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["sensor-sim.toml", "config/sensor-sim.toml"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    #[serde(default = "default_broker")]
    pub broker: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    /// A random suffix is appended so concurrent simulators never collide
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,
}

fn default_broker() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_base_topic() -> String {
    "sensors".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_client_id_prefix() -> String {
    "sensor-sim".to_string()
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            broker: default_broker(),
            port: default_port(),
            username: None,
            password: None,
            base_topic: default_base_topic(),
            keep_alive_secs: default_keep_alive(),
            client_id_prefix: default_client_id_prefix(),
        }
    }
}

impl MqttSection {
    /// Username and password, only when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }
}

/// Publishing loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeSection {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// How long to wait for the broker acknowledgment at startup
    #[serde(default = "default_connect_grace")]
    pub connect_grace_secs: u64,
    /// Fixed seed for reproducible readings
    pub seed: Option<u64>,
}

fn default_interval() -> u64 {
    5
}

fn default_connect_grace() -> u64 {
    2
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            connect_grace_secs: default_connect_grace(),
            seed: None,
        }
    }
}

impl RuntimeSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn connect_grace(&self) -> Duration {
        Duration::from_secs(self.connect_grace_secs)
    }
}

/// One `[[sensors]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorConfig {
    pub kind: String,
    /// Defaults to `{kind}_01`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_location() -> String {
    "unknown".to_string()
}

fn default_enabled() -> bool {
    true
}

impl SensorConfig {
    pub fn new(kind: &str, location: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: None,
            location: location.to_string(),
            enabled: true,
        }
    }

    pub fn identity(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{}_01", self.kind))
    }

    pub fn registration(&self) -> SensorRegistration {
        SensorRegistration {
            kind: self.kind.clone(),
            id: self.identity(),
            location: self.location.clone(),
            enabled: self.enabled,
        }
    }
}

fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::new("pms5003", "living_room"),
        SensorConfig::new("ens160", "office"),
        SensorConfig::new("scd41", "office"),
        SensorConfig::new("sen0441", "bedroom"),
        SensorConfig::new("bme280", "living_room"),
        SensorConfig::new("ds18b20", "outdoor_sensor"),
    ]
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttSection::default(),
            runtime: RuntimeSection::default(),
            sensors: default_sensors(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("Invalid topic in {field}: {source}")]
    InvalidTopic {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Duplicate sensor id: {0}")]
    DuplicateSensorId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimulatorConfig {
    /// Load and validate a TOML file without consulting the environment
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the full configuration used by the binary
    ///
    /// Loads `.env` if present, reads `path` (or the first default path that
    /// exists, or the built-in defaults), then applies environment overrides
    /// and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let mut config = match Self::locate(path) {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                let content =
                    std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
                        path: path.clone(),
                        source,
                    })?;
                Self::from_toml_str(&content)?
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn locate(path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = path {
            return Some(path.to_path_buf());
        }
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(broker) = lookup(ENV_BROKER) {
            self.mqtt.broker = broker;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.mqtt.port = parse_env(ENV_PORT, &port)?;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.mqtt.username = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.mqtt.password = Some(password);
        }
        if let Some(base_topic) = lookup(ENV_BASE_TOPIC) {
            self.mqtt.base_topic = base_topic;
        }
        if let Some(interval) = lookup(ENV_INTERVAL) {
            self.runtime.interval_secs = parse_env(ENV_INTERVAL, &interval)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "mqtt.broker cannot be empty".to_string(),
            ));
        }
        if self.mqtt.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "mqtt.port must be greater than zero".to_string(),
            ));
        }
        if self.runtime.interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "runtime.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.runtime.connect_grace_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "runtime.connect_grace_secs must be greater than zero".to_string(),
            ));
        }

        validate_base_topic(&self.mqtt.base_topic).map_err(|source| ConfigError::InvalidTopic {
            field: "mqtt.base_topic".to_string(),
            source,
        })?;

        let mut seen = HashSet::new();
        for (index, sensor) in self.sensors.iter().enumerate() {
            validate_topic_segment(&sensor.kind).map_err(|source| ConfigError::InvalidTopic {
                field: format!("sensors[{index}].kind"),
                source,
            })?;

            let identity = sensor.identity();
            validate_topic_segment(&identity).map_err(|source| ConfigError::InvalidTopic {
                field: format!("sensors[{index}].id"),
                source,
            })?;

            if !seen.insert(identity.clone()) {
                return Err(ConfigError::DuplicateSensorId(identity));
            }
        }

        Ok(())
    }

    /// Sensor registrations in configuration order
    pub fn registrations(&self) -> Vec<SensorRegistration> {
        self.sensors.iter().map(SensorConfig::registration).collect()
    }

    /// Copy safe to print: the password is masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.mqtt.password.is_some() {
            copy.mqtt.password = Some("********".to_string());
        }
        copy
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue {
            name,
            value: value.to_string(),
        })
}
