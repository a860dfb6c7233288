//! MQTT client implementation on rumqttc (v5 API)
//!
//! - [`connection`] - pure connection state and option handling
//! - [`events`] - pure routing of event-loop events
//! - [`client`] - impure I/O operations and coordination
//!
//! # Usage
//!
//! ```rust,no_run
//! use sensor_sim::config::MqttSection;
//! use sensor_sim::transport::mqtt::MqttClient;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let mut client = MqttClient::new(&MqttSection::default())?;
//! client.connect().await?;
//! client.wait_for_connection(Duration::from_secs(2)).await?;
//! client.publish("sensors/ds18b20/ds18b20_01", br#"{"temperature":21.4}"#.to_vec()).await?;
//! client.disconnect().await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod client;
pub mod connection;
pub mod events;

pub use client::MqttClient;
pub use connection::{configure_mqtt_options, generate_client_id, ConnectionState, MqttError};
pub use events::{EventRoute, EventRouter};
