use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::messages::BusAnnouncement;
use crate::notifier::{AlertKind, MessageBus, Notifier};

/// Turns inbound `new_device` signals into alerts. Never touches the tracked
/// device set, so it can run alongside the monitor loop.
pub struct AnnouncementRelay<B> {
    rx: broadcast::Receiver<BusAnnouncement>,
    notifier: Notifier<B>,
}

impl<B: MessageBus> AnnouncementRelay<B> {
    pub fn new(rx: broadcast::Receiver<BusAnnouncement>, notifier: Notifier<B>) -> Self {
        AnnouncementRelay { rx, notifier }
    }

    pub async fn run(&mut self) {
        loop {
            match self.rx.recv().await {
                Ok(BusAnnouncement::NewDevice(payload)) => {
                    info!("New device announced: {}", payload);
                    if let Err(err) = self
                        .notifier
                        .publish_alert(AlertKind::NewDeviceAnnounced)
                        .await
                    {
                        error!("Error relaying new device alert: {}", err);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Announcement channel closed");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Relay lagged, {} announcements dropped", skipped);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Topics;
    use crate::testing::RecordingBus;

    #[tokio::test]
    async fn test_announcement_becomes_alert() {
        let bus = RecordingBus::default();
        let (tx, rx) = broadcast::channel(10);
        let notifier = Notifier::new(bus.clone(), Topics::new("NETWORK"));
        let mut relay = AnnouncementRelay::new(rx, notifier);

        tx.send(BusAnnouncement::NewDevice("aa:bb:cc:dd:ee:ff".to_string()))
            .unwrap();
        tx.send(BusAnnouncement::NewDevice(String::new())).unwrap();
        drop(tx);
        relay.run().await;

        assert_eq!(
            bus.sent_on("NETWORK/alert"),
            vec![
                "New device connected to the network",
                "New device connected to the network",
            ]
        );
        assert!(bus.sent_on("NETWORK/device").is_empty());
    }

    #[tokio::test]
    async fn test_alert_failure_keeps_relaying() {
        let bus = RecordingBus::failing_on("NETWORK/alert");
        let (tx, rx) = broadcast::channel(10);
        let notifier = Notifier::new(bus.clone(), Topics::new("NETWORK"));
        let mut relay = AnnouncementRelay::new(rx, notifier);

        tx.send(BusAnnouncement::NewDevice("first".to_string())).unwrap();
        tx.send(BusAnnouncement::NewDevice("second".to_string())).unwrap();
        drop(tx);

        // Returns only once the channel is closed, so both were consumed.
        relay.run().await;
        assert!(bus.sent().is_empty());
    }
}
