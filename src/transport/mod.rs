//! Transport layer for publishing readings
//!
//! The [`Transport`] trait abstracts the broker session so the publisher and
//! lifecycle controller can be driven by [`mqtt::MqttClient`] in production
//! and by a mock in tests.

use crate::protocol::{Reading, TopicAddress};
use std::time::Duration;
use tracing::{debug, error, warn};

pub mod mqtt;

/// Broker session used by the simulator
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the session
    ///
    /// Returns once the connection attempt is under way; the broker
    /// acknowledgment is awaited separately with [`Transport::wait_for_connection`].
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Wait up to `timeout` for the broker to acknowledge the session
    async fn wait_for_connection(&self, timeout: Duration) -> Result<(), Self::Error>;

    /// Whether the latest broker acknowledgment is still in effect
    fn is_connected(&self) -> bool;

    /// Publish a payload with at-least-once delivery, never retained
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error>;

    /// Serialize and publish a reading
    ///
    /// Failures are logged and reported as `false`, never propagated.
    async fn publish_reading(&self, topic: &TopicAddress, reading: &Reading) -> bool {
        let payload = match reading.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    topic = %topic,
                    sensor_id = %reading.sensor_id,
                    "Failed to serialize reading: {}",
                    e
                );
                return false;
            }
        };

        match self.publish(topic.as_str(), payload).await {
            Ok(()) => {
                debug!(topic = %topic, sensor_id = %reading.sensor_id, "Published reading");
                true
            }
            Err(e) => {
                warn!(
                    topic = %topic,
                    sensor_id = %reading.sensor_id,
                    "Failed to publish reading: {}",
                    e
                );
                false
            }
        }
    }

    /// End the session; safe to call repeatedly or without a prior connect
    async fn disconnect(&mut self) -> Result<(), Self::Error>;
}

