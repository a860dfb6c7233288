//! Impure I/O operations for the MQTT client
//!
//! The rumqttc event loop runs in a background task that reports the session
//! state through a watch channel. There is no automatic reconnection: the
//! first event-loop error ends the task and leaves the state `Disconnected`.

use super::connection::{configure_mqtt_options, generate_client_id, ConnectionState, MqttError};
use super::events::{EventRoute, EventRouter};
use crate::config::MqttSection;
use crate::mqtt_span;
use crate::transport::Transport;
use async_trait::async_trait;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, EventLoop};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

/// Capacity of the request channel between client and event loop
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// How long `disconnect` waits for the event loop before aborting it
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// MQTT transport client publishing sensor readings
pub struct MqttClient {
    client_id: String,
    broker: String,
    client: AsyncClient,
    /// Taken by `connect()`; the mutex keeps the client `Sync`
    event_loop: Mutex<Option<EventLoop>>,
    event_loop_handle: Option<JoinHandle<()>>,
    state_rx: Option<watch::Receiver<ConnectionState>>,
    state_tx: Option<watch::Sender<ConnectionState>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl MqttClient {
    pub fn new(config: &MqttSection) -> Result<Self, MqttError> {
        let client_id = generate_client_id(&config.client_id_prefix);
        let mqtt_options = configure_mqtt_options(&client_id, config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        Ok(MqttClient {
            client_id,
            broker: format!("{}:{}", config.broker, config.port),
            client,
            event_loop: Mutex::new(Some(event_loop)),
            event_loop_handle: None,
            state_rx: None,
            state_tx: None,
            shutdown_tx: None,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Create connection state and shutdown channels
    #[allow(clippy::type_complexity)]
    fn setup_connection_channels() -> (
        (
            watch::Sender<ConnectionState>,
            watch::Receiver<ConnectionState>,
        ),
        (watch::Sender<bool>, watch::Receiver<bool>),
    ) {
        let state_channels = watch::channel(ConnectionState::Connecting);
        let shutdown_channels = watch::channel(false);
        (state_channels, shutdown_channels)
    }

    /// Wait for connection confirmation (ConnAck) with timeout
    async fn wait_for_connection_confirmation(
        mut state_rx: watch::Receiver<ConnectionState>,
        timeout: Duration,
    ) -> Result<(), MqttError> {
        let timeout_result = tokio::time::timeout(timeout, async {
            loop {
                match &*state_rx.borrow_and_update() {
                    ConnectionState::Connected => return Ok(()),
                    ConnectionState::Disconnected(reason) => {
                        return Err(MqttError::ConnectionFailed(reason.clone()));
                    }
                    ConnectionState::Connecting => {}
                }
                if state_rx.changed().await.is_err() {
                    return Err(MqttError::ConnectionFailed(
                        "State channel closed".to_string(),
                    ));
                }
            }
        })
        .await;

        match timeout_result {
            Ok(result) => result,
            Err(_) => Err(MqttError::ConnAckTimeout(timeout)),
        }
    }

    /// Start the session
    ///
    /// Spawns the event loop and returns immediately. Network failures are
    /// reported through the connection state, not through this result.
    pub async fn connect(&mut self) -> Result<(), MqttError> {
        let event_loop = self
            .event_loop
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(MqttError::AlreadyStarted)?;

        let ((state_tx, state_rx), (shutdown_tx, shutdown_rx)) =
            Self::setup_connection_channels();
        self.state_rx = Some(state_rx);
        self.state_tx = Some(state_tx.clone());
        self.shutdown_tx = Some(shutdown_tx);

        info!(
            client_id = %self.client_id,
            broker = %self.broker,
            "Connecting to MQTT broker"
        );

        let client_id = self.client_id.clone();
        let span = mqtt_span!(client_id = %client_id, operation = "event_loop");
        let handle = tokio::spawn(
            Self::run_event_loop(client_id, event_loop, state_tx, shutdown_rx).instrument(span),
        );
        self.event_loop_handle = Some(handle);

        Ok(())
    }

    /// Drive the rumqttc event loop until an error, a broker DISCONNECT or shutdown
    async fn run_event_loop(
        client_id: String,
        mut event_loop: EventLoop,
        state_tx: watch::Sender<ConnectionState>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        debug!(client_id = %client_id, "MQTT event loop started");

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Shutdown signal received, stopping MQTT event loop");
                        break;
                    }
                }
                event_result = event_loop.poll() => {
                    match event_result {
                        Ok(event) => {
                            let route = EventRouter::route_mqtt_event(&event);
                            if !Self::process_event_route(route, &state_tx) {
                                break;
                            }
                        }
                        Err(e) => {
                            error!(client_id = %client_id, "MQTT connection error: {}", e);
                            state_tx.send_replace(ConnectionState::Disconnected(e.to_string()));
                            break;
                        }
                    }
                }
            }
        }

        info!(client_id = %client_id, "MQTT event loop stopped");
    }

    /// Apply a routed event to the connection state
    /// Returns true to keep polling, false to stop the event loop
    fn process_event_route(route: EventRoute, state_tx: &watch::Sender<ConnectionState>) -> bool {
        match route {
            EventRoute::ConnectionAcknowledged => {
                info!("Connected to MQTT broker");
                state_tx.send_replace(ConnectionState::Connected);
                true
            }
            EventRoute::ConnectionRefused(reason) => {
                error!("Connection refused by MQTT broker: {}", reason);
                state_tx.send_replace(ConnectionState::Disconnected(format!(
                    "Connection refused: {reason}"
                )));
                false
            }
            EventRoute::BrokerDisconnected(reason) => {
                warn!("MQTT broker closed the session: {}", reason);
                state_tx.send_replace(ConnectionState::Disconnected(format!(
                    "Disconnected by broker: {reason}"
                )));
                false
            }
            EventRoute::PublishAcknowledged { packet_id } => {
                tracing::trace!(target: "mqtt_transport", packet_id, "PubAck received");
                true
            }
            EventRoute::InfrastructureEvent(event) => {
                tracing::trace!(target: "mqtt_transport", "MQTT event: {}", event);
                true
            }
            EventRoute::OutgoingEvent(event) => {
                tracing::trace!(target: "mqtt_transport", "MQTT outgoing: {}", event);
                true
            }
        }
    }

    /// Get current connection state
    /// Returns None if connect() has not been called
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.state_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    pub async fn wait_for_connection(&self, timeout: Duration) -> Result<(), MqttError> {
        let state_rx = self.state_rx.clone().ok_or(MqttError::NotStarted)?;
        Self::wait_for_connection_confirmation(state_rx, timeout).await
    }

    fn check_connection_state(&self) -> Result<(), MqttError> {
        let current_state = self
            .connection_state()
            .unwrap_or_else(|| ConnectionState::Disconnected("Never connected".to_string()));
        if !current_state.can_publish() {
            return Err(MqttError::NotConnected {
                state: current_state,
            });
        }
        Ok(())
    }

    /// Publish with QoS 1, never retained
    pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), MqttError> {
        self.check_connection_state()?;

        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(MqttError::PublishFailed)
    }

    /// Disconnect from the broker
    ///
    /// Requests an MQTT DISCONNECT, gives the event loop a bounded time to
    /// wind down, then aborts it. Idempotent.
    pub async fn disconnect(&mut self) -> Result<(), MqttError> {
        let Some(mut handle) = self.event_loop_handle.take() else {
            debug!("MQTT client not running, nothing to disconnect");
            self.mark_disconnected();
            return Ok(());
        };

        if let Err(e) = self.client.disconnect().await {
            // Event loop already gone, the broker has nothing to hear
            debug!("MQTT disconnect request not delivered: {}", e);
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(())) => debug!("Event loop task shut down gracefully"),
            Ok(Err(e)) if !e.is_cancelled() => warn!("Event loop task ended with error: {}", e),
            Ok(Err(_)) => {}
            Err(_) => {
                warn!("Event loop task didn't shut down gracefully, forcing abort");
                if let Some(shutdown_tx) = &self.shutdown_tx {
                    let _ = shutdown_tx.send(true);
                }
                handle.abort();
            }
        }

        self.mark_disconnected();
        info!("MQTT client disconnected");
        Ok(())
    }

    fn mark_disconnected(&self) {
        if let Some(state_tx) = &self.state_tx {
            state_tx.send_replace(ConnectionState::Disconnected(
                "Client disconnected".to_string(),
            ));
        }
    }
}

#[async_trait]
impl Transport for MqttClient {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        MqttClient::connect(self).await
    }

    async fn wait_for_connection(&self, timeout: Duration) -> Result<(), Self::Error> {
        MqttClient::wait_for_connection(self, timeout).await
    }

    fn is_connected(&self) -> bool {
        matches!(self.connection_state(), Some(ConnectionState::Connected))
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), Self::Error> {
        MqttClient::publish(self, topic, payload).await
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        MqttClient::disconnect(self).await
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }

        // No async in Drop; callers wanting a clean DISCONNECT call disconnect()
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}
