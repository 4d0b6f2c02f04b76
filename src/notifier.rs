use std::future::Future;

use log::info;

use crate::devices::DevicePublication;
use crate::error::BusError;
use crate::tracker::Direction;

/// Publish side of the message bus.
pub trait MessageBus {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), BusError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Joined,
    Left,
    NewDeviceAnnounced,
}

impl AlertKind {
    pub fn message(self) -> &'static str {
        match self {
            AlertKind::Joined | AlertKind::NewDeviceAnnounced => {
                "New device connected to the network"
            }
            AlertKind::Left => "Device disconnected from the network",
        }
    }
}

impl From<Direction> for AlertKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Joined => AlertKind::Joined,
            Direction::Left => AlertKind::Left,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    pub device: String,
    pub alert: String,
    pub new_device: String,
}

impl Topics {
    pub fn new(topic_path: &str) -> Self {
        Topics {
            device: format!("{topic_path}/device"),
            alert: format!("{topic_path}/alert"),
            new_device: format!("{topic_path}/new_device"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Notifier<B> {
    bus: B,
    topics: Topics,
}

impl<B: MessageBus> Notifier<B> {
    pub fn new(bus: B, topics: Topics) -> Self {
        Notifier { bus, topics }
    }

    pub async fn publish_state(&self, publication: &DevicePublication) -> Result<(), BusError> {
        let payload =
            serde_json::to_vec(publication).map_err(|err| BusError::PublishFailed {
                topic: self.topics.device.clone(),
                reason: err.to_string(),
            })?;
        info!(
            "Publishing {} devices on {}",
            publication.devices.len(),
            self.topics.device
        );
        self.bus.publish(&self.topics.device, payload).await
    }

    pub async fn publish_alert(&self, kind: AlertKind) -> Result<(), BusError> {
        info!("Alert on {}: {}", self.topics.alert, kind.message());
        self.bus
            .publish(&self.topics.alert, kind.message().as_bytes().to_vec())
            .await
    }
}
