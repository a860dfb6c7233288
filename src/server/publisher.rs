//! Periodic polling and publishing of sensor readings
//!
//! Every tick polls each active source once, in configuration order, and
//! publishes the reading to `{base_topic}/{kind}/{identity}`. A source that
//! fails to produce a reading, or a reading that fails to publish, is logged
//! and skipped without affecting the rest of the tick.

use crate::protocol::TopicAddress;
use crate::sensors::ReadingSource;
use crate::tick_span;
use crate::transport::Transport;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn, Instrument};

/// Running counters, returned when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub ticks: u64,
    pub published: u64,
    pub source_failures: u64,
    pub publish_failures: u64,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub published: usize,
    pub source_failures: usize,
    pub publish_failures: usize,
}

pub struct Publisher {
    sources: Vec<Box<dyn ReadingSource>>,
    base_topic: String,
    interval: Duration,
    stats: PublishStats,
    link_up: Option<bool>,
}

impl Publisher {
    pub fn new(
        sources: Vec<Box<dyn ReadingSource>>,
        base_topic: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            sources,
            base_topic: base_topic.into(),
            interval,
            stats: PublishStats::default(),
            link_up: None,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    /// Topic a source's readings are published to
    pub fn topic_for(&self, source: &dyn ReadingSource) -> TopicAddress {
        TopicAddress::new(&self.base_topic, source.kind(), source.identity())
    }

    /// Poll every source once and publish the readings
    pub async fn tick<T: Transport>(&mut self, transport: &T) -> TickOutcome {
        self.observe_connection(transport.is_connected());

        let mut outcome = TickOutcome::default();
        for index in 0..self.sources.len() {
            let source = &mut self.sources[index];
            let reading = match source.produce_reading() {
                Ok(reading) => reading,
                Err(e) => {
                    warn!(
                        sensor_kind = source.kind(),
                        sensor_id = source.identity(),
                        "Error reading sensor {}: {}",
                        source.kind(),
                        e
                    );
                    outcome.source_failures += 1;
                    continue;
                }
            };

            let topic = self.topic_for(self.sources[index].as_ref());
            if transport.publish_reading(&topic, &reading).await {
                outcome.published += 1;
            } else {
                outcome.publish_failures += 1;
            }
        }

        self.stats.ticks += 1;
        self.stats.published += outcome.published as u64;
        self.stats.source_failures += outcome.source_failures as u64;
        self.stats.publish_failures += outcome.publish_failures as u64;
        outcome
    }

    /// Log connection transitions seen between ticks
    fn observe_connection(&mut self, connected: bool) {
        match (self.link_up, connected) {
            (Some(false), true) => info!("MQTT connection restored, publishing resumed"),
            (Some(true), false) => warn!("MQTT connection lost, readings will not be delivered"),
            (None, false) => warn!("MQTT connection not available, readings will not be delivered"),
            _ => {}
        }
        self.link_up = Some(connected);
    }

    /// Tick until `shutdown` turns true
    ///
    /// The stop flag is checked before every tick and interrupts the sleep
    /// between ticks; a tick in progress always completes.
    pub async fn run<T: Transport>(
        &mut self,
        transport: &T,
        shutdown: &mut watch::Receiver<bool>,
    ) -> PublishStats {
        info!(
            sensors = self.sources.len(),
            interval_secs = self.interval.as_secs_f64(),
            "Publishing loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let tick = self.stats.ticks + 1;
            self.tick(transport).instrument(tick_span!(tick)).await;

            if !interruptible_sleep(shutdown, self.interval).await {
                break;
            }
        }

        info!(
            ticks = self.stats.ticks,
            published = self.stats.published,
            source_failures = self.stats.source_failures,
            publish_failures = self.stats.publish_failures,
            "Publishing loop stopped"
        );
        self.stats.clone()
    }
}

/// Sleep for `delay` unless shutdown is signalled first
/// Returns true if sleep completed, false if shutdown requested
pub async fn interruptible_sleep(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone, nobody can ask us to stop any more
                    (&mut sleep).await;
                    return true;
                }
                if *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
