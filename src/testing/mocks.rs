//! Mock implementations for testing
//!
//! Provides a mock [`Transport`] and mock [`ReadingSource`]s so the publisher
//! and lifecycle controller can be exercised without a broker.

use crate::protocol::{Measurements, Reading};
use crate::sensors::{ReadingSource, SensorRegistration, SourceError};
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

pub type PublishedMessage = (String, Vec<u8>);

#[derive(Debug, Error, PartialEq)]
pub enum MockTransportError {
    #[error("Mock connection failure")]
    ConnectFailed,
    #[error("Mock broker never acknowledged within {0:?}")]
    NoAcknowledgment(Duration),
    #[error("Mock broker refused the connection")]
    Refused,
    #[error("Mock transport not connected")]
    NotConnected,
    #[error("Mock publish failure on {0}")]
    PublishFailed(String),
}

/// How the mock broker answers a connection attempt
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ConnectBehavior {
    /// Connect succeeds and is acknowledged immediately
    #[default]
    Acknowledge,
    /// `connect()` itself returns an error
    FailConnect,
    /// `connect()` succeeds but no acknowledgment ever arrives
    NeverAcknowledge,
    /// `connect()` succeeds and the broker refuses the session
    Refuse,
}

/// Mock transport for testing
///
/// Clones share state, so a test can keep a clone to inspect what a server
/// that owns the original has published.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub published_messages: Arc<Mutex<Vec<PublishedMessage>>>,
    connected: Arc<AtomicBool>,
    connect_calls: Arc<AtomicUsize>,
    disconnect_calls: Arc<AtomicUsize>,
    connect_behavior: ConnectBehavior,
    failing_topics: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_behavior(behavior: ConnectBehavior) -> Self {
        Self {
            connect_behavior: behavior,
            ..Default::default()
        }
    }

    /// Publishing to `topic` always fails
    pub fn with_failing_topic(mut self, topic: impl Into<String>) -> Self {
        self.failing_topics.push(topic.into());
        self
    }

    /// Simulate the broker connection dropping or coming back
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub async fn get_published_messages(&self) -> Vec<PublishedMessage> {
        self.published_messages.lock().await.clone()
    }

    pub async fn published_topics(&self) -> Vec<String> {
        self.published_messages
            .lock()
            .await
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub async fn clear_history(&self) {
        self.published_messages.lock().await.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = MockTransportError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        match self.connect_behavior {
            ConnectBehavior::FailConnect => Err(MockTransportError::ConnectFailed),
            ConnectBehavior::Acknowledge => {
                self.set_connected(true);
                Ok(())
            }
            ConnectBehavior::NeverAcknowledge | ConnectBehavior::Refuse => Ok(()),
        }
    }

    async fn wait_for_connection(&self, timeout: Duration) -> Result<(), Self::Error> {
        if self.is_connected() {
            return Ok(());
        }
        match self.connect_behavior {
            ConnectBehavior::NeverAcknowledge => {
                tokio::time::sleep(timeout).await;
                Err(MockTransportError::NoAcknowledgment(timeout))
            }
            ConnectBehavior::Refuse => Err(MockTransportError::Refused),
            _ => Err(MockTransportError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(MockTransportError::NotConnected);
        }
        if self.failing_topics.iter().any(|t| t == topic) {
            return Err(MockTransportError::PublishFailed(topic.to_string()));
        }

        let mut messages = self.published_messages.lock().await;
        messages.push((topic.to_string(), payload));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.set_connected(false);
        Ok(())
    }
}

/// Source that returns the same measurements on every poll
#[derive(Debug)]
pub struct FixedSource {
    registration: SensorRegistration,
    measurements: Measurements,
}

impl FixedSource {
    pub fn new(registration: SensorRegistration, measurements: Measurements) -> Self {
        Self {
            registration,
            measurements,
        }
    }
}

impl ReadingSource for FixedSource {
    fn kind(&self) -> &str {
        &self.registration.kind
    }

    fn identity(&self) -> &str {
        &self.registration.id
    }

    fn location(&self) -> &str {
        &self.registration.location
    }

    fn produce_reading(&mut self) -> Result<Reading, SourceError> {
        Ok(Reading::new(
            self.registration.id.clone(),
            self.registration.location.clone(),
            Utc::now(),
            self.measurements.clone(),
        ))
    }
}

/// Source whose every poll fails
#[derive(Debug)]
pub struct FailingSource {
    registration: SensorRegistration,
    attempts: Arc<AtomicUsize>,
}

impl FailingSource {
    pub fn new(registration: SensorRegistration) -> Self {
        Self {
            registration,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of poll attempts
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        self.attempts.clone()
    }
}

impl ReadingSource for FailingSource {
    fn kind(&self) -> &str {
        &self.registration.kind
    }

    fn identity(&self) -> &str {
        &self.registration.id
    }

    fn location(&self) -> &str {
        &self.registration.location
    }

    fn produce_reading(&mut self) -> Result<Reading, SourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::read_failed(
            self.registration.id.clone(),
            "simulated hardware fault",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_records_messages() {
        let mut transport = MockTransport::new();
        let observer = transport.clone();

        transport.connect().await.unwrap();
        transport.publish("a/b/c", b"{}".to_vec()).await.unwrap();

        assert_eq!(observer.connect_calls(), 1);
        assert_eq!(observer.published_topics().await, vec!["a/b/c"]);
    }

    #[tokio::test]
    async fn test_mock_transport_rejects_when_disconnected() {
        let transport = MockTransport::new();

        let result = transport.publish("a/b/c", Vec::new()).await;

        assert_eq!(result, Err(MockTransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_mock_transport_failing_topic() {
        let mut transport = MockTransport::new().with_failing_topic("bad/topic/x");
        transport.connect().await.unwrap();

        assert!(transport.publish("bad/topic/x", Vec::new()).await.is_err());
        assert!(transport.publish("good/topic/x", Vec::new()).await.is_ok());
    }

    #[test]
    fn test_failing_source_counts_attempts() {
        let mut source = FailingSource::new(SensorRegistration::new("broken", "broken_01", "lab"));
        let attempts = source.attempts();

        assert!(source.produce_reading().is_err());
        assert!(source.produce_reading().is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
