//! Sensor server lifecycle
//!
//! Startup order: connect, wait a bounded grace period for the broker
//! acknowledgment, build the active sensor set, then hand over to the
//! [`Publisher`]. Shutdown lets the current tick finish and tears the
//! transport down.

use super::publisher::{PublishStats, Publisher};
use crate::config::{ConfigError, SimulatorConfig};
use crate::lifecycle_span;
use crate::sensors::{SensorRegistry, SourceError};
use crate::transport::Transport;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Sensor server with dependency-injected transport
pub struct SensorServer<T>
where
    T: Transport + 'static,
{
    config: SimulatorConfig,
    registry: SensorRegistry,
    transport: T,
    publisher: Option<Publisher>,
    phase: Phase,
}

impl<T> SensorServer<T>
where
    T: Transport + 'static,
{
    /// Server using the built-in sensor kinds
    pub fn new(config: SimulatorConfig, transport: T) -> Self {
        Self::with_registry(config, transport, SensorRegistry::with_builtin_sensors())
    }

    pub fn with_registry(config: SimulatorConfig, transport: T, registry: SensorRegistry) -> Self {
        Self {
            config,
            registry,
            transport,
            publisher: None,
            phase: Phase::Idle,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Connect and prepare the publisher
    ///
    /// Fails without entering the publishing loop if the configuration is
    /// invalid, the broker does not acknowledge within the grace period or no
    /// sensor is enabled.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        self.config.validate()?;

        let grace = self.config.runtime.connect_grace();
        info!(
            broker = %self.config.mqtt.broker,
            port = self.config.mqtt.port,
            "Starting sensor server"
        );

        self.transport
            .connect()
            .await
            .map_err(|e| LifecycleError::ConnectionFailed(Box::new(e)))?;

        debug!(grace_secs = grace.as_secs_f64(), "Waiting for broker acknowledgment");
        self.transport
            .wait_for_connection(grace)
            .await
            .map_err(|e| LifecycleError::ConnectionFailed(Box::new(e)))?;

        if !self.transport.is_connected() {
            return Err(LifecycleError::NotConnected);
        }
        info!("Connected to MQTT broker");

        let sources = self
            .registry
            .build_active(&self.config.registrations(), self.config.runtime.seed)?;
        if sources.is_empty() {
            return Err(LifecycleError::NoActiveSensors);
        }

        self.publisher = Some(Publisher::new(
            sources,
            self.config.mqtt.base_topic.clone(),
            self.config.runtime.interval(),
        ));
        self.phase = Phase::Running;
        info!("Sensor server started");
        Ok(())
    }

    /// Start, publish until `shutdown` turns true, then stop
    ///
    /// A shutdown request during the startup grace wait abandons startup.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PublishStats, LifecycleError> {
        let startup = tokio::select! {
            result = self.start().instrument(lifecycle_span!(phase = "start")) => Some(result),
            _ = wait_for_shutdown(&mut shutdown) => None,
        };

        match startup {
            None => {
                info!("Shutdown requested during startup");
                self.stop().await;
                Ok(PublishStats::default())
            }
            Some(Err(e)) => {
                error!("Sensor server failed to start: {}", e);
                self.stop().await;
                Err(e)
            }
            Some(Ok(())) => {
                let mut publisher = self.publisher.take().ok_or(LifecycleError::NotConnected)?;
                let stats = publisher.run(&self.transport, &mut shutdown).await;
                info!("Shutdown requested, stopping sensor server");
                self.stop().await;
                Ok(stats)
            }
        }
    }

    /// Stop the server and disconnect the transport
    ///
    /// Idempotent, and safe after a failed or abandoned start. Transport
    /// errors are logged, not returned.
    pub async fn stop(&mut self) {
        if self.phase == Phase::Stopped {
            debug!("Sensor server already stopped");
            return;
        }
        self.phase = Phase::Stopped;
        self.publisher = None;

        async {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Error while disconnecting transport: {}", e);
            }
        }
        .instrument(lifecycle_span!(phase = "stop"))
        .await;

        info!("Sensor server stopped");
    }
}

/// Resolves once the flag is true; never if the sender is dropped first
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid configuration")]
    InvalidConfig(#[from] ConfigError),
    #[error("Failed to connect to MQTT broker")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("MQTT broker connection not established")]
    NotConnected,
    #[error("Failed to build sensors")]
    SensorSetup(#[from] SourceError),
    #[error("No active sensors configured")]
    NoActiveSensors,
}
