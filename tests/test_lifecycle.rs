//! End-to-end server tests against the mock transport
//!
//! Runs the full start → publish → stop cycle on paused time, so interval
//! timing is exact and the tests finish instantly.

use rand::rngs::StdRng;
use sensor_sim::config::{SensorConfig, SimulatorConfig};
use sensor_sim::protocol::{Measurements, Reading};
use sensor_sim::sensors::{ReadingSource, SensorRegistry};
use sensor_sim::server::{LifecycleError, PublishStats, SensorServer};
use sensor_sim::testing::mocks::{ConnectBehavior, FailingSource, FixedSource, MockTransport};
use std::time::Duration;
use tokio::sync::watch;

fn seeded_config() -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    config.runtime.seed = Some(2024);
    config
}

/// Request shutdown after `after` of (paused) time
fn shutdown_after(after: Duration) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(true);
    });
    rx
}

#[tokio::test(start_paused = true)]
async fn test_run_publishes_every_sensor_each_interval() {
    // Arrange
    let transport = MockTransport::new();
    let mut server = SensorServer::new(seeded_config(), transport.clone());

    // Act: ticks at 0s and 5s, shutdown at 7.5s
    let stats = server.run(shutdown_after(Duration::from_millis(7_500))).await.unwrap();

    // Assert
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.published, 12);
    assert_eq!(transport.disconnect_calls(), 1);

    let topics = transport.published_topics().await;
    assert_eq!(topics.len(), 12);
    assert_eq!(&topics[..6], &topics[6..]);
    assert_eq!(topics[0], "sensors/pms5003/pms5003_01");
    assert_eq!(topics[5], "sensors/ds18b20/ds18b20_01");
}

#[tokio::test(start_paused = true)]
async fn test_published_payloads_are_valid_readings() {
    let transport = MockTransport::new();
    let mut server = SensorServer::new(seeded_config(), transport.clone());

    server.run(shutdown_after(Duration::from_secs(1))).await.unwrap();

    for (topic, payload) in transport.get_published_messages().await {
        let reading: Reading = serde_json::from_slice(&payload).unwrap();
        assert!(topic.ends_with(&reading.sensor_id), "{topic}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_disabled_sensors_are_not_published() {
    let mut config = seeded_config();
    config.sensors = vec![
        SensorConfig::new("scd41", "office"),
        SensorConfig {
            enabled: false,
            ..SensorConfig::new("bme280", "attic")
        },
    ];
    let transport = MockTransport::new();
    let mut server = SensorServer::new(config, transport.clone());

    server.run(shutdown_after(Duration::from_secs(1))).await.unwrap();

    assert_eq!(
        transport.published_topics().await,
        vec!["sensors/scd41/scd41_01"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_connection_drop_skips_readings_until_restored() {
    let transport = MockTransport::new();
    let mut config = seeded_config();
    config.sensors = vec![SensorConfig::new("ds18b20", "garden")];
    let mut server = SensorServer::new(config, transport.clone());

    let link = transport.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        link.set_connected(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        link.set_connected(true);
    });

    // Ticks at 0s (up), 5s (down) and 10s (restored)
    let stats = server
        .run(shutdown_after(Duration::from_millis(12_500)))
        .await
        .unwrap();

    assert_eq!(
        stats,
        PublishStats {
            ticks: 3,
            published: 2,
            source_failures: 0,
            publish_failures: 1,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_failing_source_does_not_stop_siblings() {
    let mut registry = SensorRegistry::new();
    registry.register("broken", |registration, _rng: StdRng| {
        Box::new(FailingSource::new(registration)) as Box<dyn ReadingSource>
    });
    registry.register("steady", |registration, _rng: StdRng| {
        Box::new(FixedSource::new(
            registration,
            Measurements::Temperature { temperature: 21.5 },
        )) as Box<dyn ReadingSource>
    });

    let mut config = seeded_config();
    config.sensors = vec![
        SensorConfig::new("broken", "lab"),
        SensorConfig::new("steady", "lab"),
    ];
    let transport = MockTransport::new();
    let mut server = SensorServer::with_registry(config, transport.clone(), registry);

    let stats = server
        .run(shutdown_after(Duration::from_millis(5_500)))
        .await
        .unwrap();

    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.source_failures, 2);
    assert_eq!(stats.published, 2);
    assert_eq!(
        transport.published_topics().await,
        vec!["sensors/steady/steady_01", "sensors/steady/steady_01"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_never_publishes() {
    let transport = MockTransport::with_connect_behavior(ConnectBehavior::Refuse);
    let mut server = SensorServer::new(seeded_config(), transport.clone());

    let result = server.run(shutdown_after(Duration::from_secs(60))).await;

    assert!(matches!(result, Err(LifecycleError::ConnectionFailed(_))));
    assert!(transport.get_published_messages().await.is_empty());
    assert_eq!(transport.disconnect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_base_topic_and_interval() {
    let mut config = seeded_config();
    config.mqtt.base_topic = "home/lab".to_string();
    config.runtime.interval_secs = 2;
    config.sensors = vec![SensorConfig {
        id: Some("co2_desk".to_string()),
        ..SensorConfig::new("scd41", "desk")
    }];
    let transport = MockTransport::new();
    let mut server = SensorServer::new(config, transport.clone());

    // Ticks at 0, 2, 4 and 6 seconds
    let stats = server
        .run(shutdown_after(Duration::from_millis(7_000)))
        .await
        .unwrap();

    assert_eq!(stats.ticks, 4);
    assert!(transport
        .published_topics()
        .await
        .iter()
        .all(|topic| topic == "home/lab/scd41/co2_desk"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_identity_never_publishes() {
    let mut config = seeded_config();
    config.sensors = vec![
        SensorConfig::new("bme280", "hall"),
        SensorConfig::new("bme280", "attic"),
    ];
    let transport = MockTransport::new();
    let mut server = SensorServer::new(config, transport.clone());

    let result = server.run(shutdown_after(Duration::from_secs(60))).await;

    assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
    assert!(transport.get_published_messages().await.is_empty());
    assert_eq!(transport.connect_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_base_topic_with_leading_slash_is_rejected() {
    let mut config = seeded_config();
    config.mqtt.base_topic = "/sensors".to_string();
    let transport = MockTransport::new();
    let mut server = SensorServer::new(config, transport.clone());

    let result = server.run(shutdown_after(Duration::from_secs(60))).await;

    assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
    assert!(transport.get_published_messages().await.is_empty());
}
