use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;

use crate::devices::DevicePublication;
use crate::error::{BusError, SourceError};
use crate::notifier::{MessageBus, Notifier};
use crate::source::SnapshotSource;
use crate::tracker::{ChangeOutcome, PresenceTracker};

/// The scan loop: capture, compare, publish, once per interval.
pub struct Monitor<S, B> {
    source: S,
    tracker: PresenceTracker,
    notifier: Notifier<B>,
    interval: Duration,
}

impl<S: SnapshotSource, B: MessageBus> Monitor<S, B> {
    pub fn new(source: S, notifier: Notifier<B>, interval: Duration) -> Self {
        Monitor {
            source,
            tracker: PresenceTracker::new(),
            notifier,
            interval,
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// Runs one scan. Returns `None` when the snapshot could not be taken.
    ///
    /// Only a failed state publish is an error; alerts are best effort.
    pub async fn tick(&mut self) -> Result<Option<ChangeOutcome>, BusError> {
        let snapshot = match self.source.capture().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Skipping scan: {}", err);
                return Ok(None);
            }
        };

        let outcome = self.tracker.observe(snapshot);
        match &outcome {
            ChangeOutcome::Unchanged => {
                debug!("No change in {} devices", self.tracker.current().len());
            }
            ChangeOutcome::Changed { direction, devices } => {
                info!(
                    "Device list changed ({:?}), {} devices present",
                    direction,
                    devices.len()
                );
                debug!("Devices: {:?}", devices.as_slice());
                let publication = DevicePublication {
                    ip_address: annotation("local IP", self.source.local_ip().await),
                    mac_address: annotation("local MAC", self.source.local_mac().await),
                    devices: devices.clone(),
                };
                self.notifier.publish_state(&publication).await?;

                if let Err(err) = self.notifier.publish_alert((*direction).into()).await {
                    warn!("Error publishing alert: {}", err);
                }
            }
        }

        Ok(Some(outcome))
    }

    /// Ticks until `shutdown` resolves or a state publish fails.
    pub async fn run_loop(mut self, shutdown: impl Future<Output = ()>) -> Result<(), BusError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down monitor loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await?;
                }
            }
        }
        Ok(())
    }
}

fn annotation(what: &str, lookup: Result<String, SourceError>) -> String {
    lookup.unwrap_or_else(|err| {
        warn!("Unable to determine {}: {}", what, err);
        String::new()
    })
}
