//! Startup behavior when no broker is listening
//!
//! Uses the real rumqttc client against a local port nothing listens on:
//! startup must fail within the grace period instead of publishing into the
//! void, and teardown must still succeed.

use sensor_sim::config::{MqttSection, SimulatorConfig};
use sensor_sim::server::{LifecycleError, SensorServer};
use sensor_sim::transport::mqtt::{ConnectionState, MqttClient, MqttError};
use sensor_sim::transport::Transport;
use std::net::TcpListener;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A local port with nothing listening on it
fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn unreachable_broker() -> MqttSection {
    MqttSection {
        broker: "127.0.0.1".to_string(),
        port: unused_port(),
        ..MqttSection::default()
    }
}

#[tokio::test]
async fn test_client_reports_failure_when_broker_unavailable() {
    // Arrange
    let mut client = MqttClient::new(&unreachable_broker()).unwrap();

    // Act
    client.connect().await.unwrap();
    let result = client.wait_for_connection(Duration::from_secs(2)).await;

    // Assert
    assert!(matches!(
        result,
        Err(MqttError::ConnectionFailed(_)) | Err(MqttError::ConnAckTimeout(_))
    ));
    assert!(!client.is_connected());
    assert!(matches!(
        client.connection_state(),
        Some(ConnectionState::Disconnected(_)) | Some(ConnectionState::Connecting)
    ));

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_publish_without_connection_is_rejected() {
    let mut client = MqttClient::new(&unreachable_broker()).unwrap();
    client.connect().await.unwrap();
    let _ = client.wait_for_connection(Duration::from_secs(2)).await;

    let result = client.publish("sensors/bme280/bme280_01", b"{}".to_vec()).await;

    assert!(matches!(result, Err(MqttError::NotConnected { .. })));
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_is_idempotent_without_broker() {
    let mut client = MqttClient::new(&unreachable_broker()).unwrap();
    client.connect().await.unwrap();

    client.disconnect().await.unwrap();
    client.disconnect().await.unwrap();

    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let mut client = MqttClient::new(&unreachable_broker()).unwrap();
    client.connect().await.unwrap();

    assert!(matches!(
        client.connect().await,
        Err(MqttError::AlreadyStarted)
    ));
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_server_exits_within_grace_period() {
    let mut config = SimulatorConfig::default();
    config.mqtt = unreachable_broker();
    config.runtime.connect_grace_secs = 2;
    let transport = MqttClient::new(&config.mqtt).unwrap();
    let mut server = SensorServer::new(config, transport);
    let (_tx, rx) = watch::channel(false);

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(10), server.run(rx))
        .await
        .expect("server should give up on its own");

    assert!(matches!(result, Err(LifecycleError::ConnectionFailed(_))));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert!(!server.transport().is_connected());
}
