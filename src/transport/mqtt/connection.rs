//! Pure connection state and option handling for the MQTT client

use crate::config::MqttSection;
use rumqttc::v5::MqttOptions;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Connection state for MQTT client
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Session requested, waiting for ConnAck
    Connecting,
    /// ConnAck received, publishing allowed
    Connected,
    /// Disconnected with reason
    Disconnected(String),
}

impl ConnectionState {
    pub fn can_publish(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid MQTT options: {0}")]
    InvalidOptions(String),
    #[error("Client already started")]
    AlreadyStarted,
    #[error("Client not started")]
    NotStarted,
    #[error("ConnAck timeout - no acknowledgment from broker within {0:?}")]
    ConnAckTimeout(Duration),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Not connected - current state: {state:?}")]
    NotConnected { state: ConnectionState },
    #[error("Publishing failed")]
    PublishFailed(#[source] rumqttc::v5::ClientError),
}

/// Minimum keep-alive accepted by the client library
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Unique client id: configured prefix plus a random suffix
pub fn generate_client_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}

/// Pure function to build MQTT options from config
pub fn configure_mqtt_options(
    client_id: &str,
    config: &MqttSection,
) -> Result<MqttOptions, MqttError> {
    let host = config.broker.trim();
    if host.is_empty() {
        return Err(MqttError::InvalidOptions("broker host is empty".to_string()));
    }
    if config.port == 0 {
        return Err(MqttError::InvalidOptions("broker port is zero".to_string()));
    }
    if config.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
        return Err(MqttError::InvalidOptions(format!(
            "keep alive must be at least {MIN_KEEP_ALIVE_SECS}s, got {}s",
            config.keep_alive_secs
        )));
    }

    let mut mqtt_options = MqttOptions::new(client_id, host, config.port);
    mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    mqtt_options.set_clean_start(true);

    // Partial credentials are treated as absent
    if let Some((username, password)) = config.credentials() {
        mqtt_options.set_credentials(username, password);
    }

    Ok(mqtt_options)
}
