//! Sensor Simulator - simulated environmental sensors publishing over MQTT
//!
//! Simulates a set of environmental sensors (particulate matter, VOC/air
//! quality, CO₂, formaldehyde, temperature/humidity/pressure) and publishes
//! one JSON reading per sensor to an MQTT broker at a fixed interval.
//!
//! # Overview
//!
//! - [`protocol`]: reading payloads and topic addressing
//! - [`sensors`]: the [`ReadingSource`] capability, the built-in simulators
//!   and the [`SensorRegistry`] that creates them by kind name
//! - [`transport`]: the broker connection behind the [`transport::Transport`] trait
//! - [`server`]: the periodic [`Publisher`] and the [`SensorServer`] lifecycle
//! - [`config`]: TOML file plus environment overrides
//!
//! # Quick Start
//!
//! ```rust
//! use sensor_sim::config::SimulatorConfig;
//! use sensor_sim::sensors::SensorRegistry;
//!
//! let mut config = SimulatorConfig::default();
//! config.runtime.seed = Some(42);
//!
//! let registry = SensorRegistry::with_builtin_sensors();
//! let mut sources = registry
//!     .build_active(&config.registrations(), config.runtime.seed)
//!     .unwrap();
//!
//! for source in sources.iter_mut() {
//!     let reading = source.produce_reading().unwrap();
//!     let payload = serde_json::to_string(&reading).unwrap();
//!     println!("{}/{}/{} {}", config.mqtt.base_topic, source.kind(), source.identity(), payload);
//! }
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod sensors;
pub mod server;
pub mod testing;
pub mod transport;

pub use config::{ConfigError, SensorConfig, SimulatorConfig};
pub use error::{SimulatorError, SimulatorResult};
pub use protocol::{Measurements, Reading, TopicAddress};
pub use sensors::{ReadingSource, SensorRegistration, SensorRegistry, SourceError};
pub use server::{PublishStats, Publisher, SensorServer};
pub use transport::mqtt::MqttClient;
