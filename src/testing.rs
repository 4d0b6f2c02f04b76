//! Test doubles for the snapshot source and the message bus.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::devices::DeviceSet;
use crate::error::{BusError, SourceError};
use crate::notifier::MessageBus;
use crate::source::SnapshotSource;

/// Records every publish; optionally rejects one topic.
#[derive(Clone, Debug, Default)]
pub struct RecordingBus {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failing_topic: Option<String>,
}

impl RecordingBus {
    pub fn failing_on(topic: &str) -> Self {
        RecordingBus {
            failing_topic: Some(topic.to_string()),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_on(&self, topic: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }
}

impl MessageBus for RecordingBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if self.failing_topic.as_deref() == Some(topic) {
            return Err(BusError::PublishFailed {
                topic: topic.to_string(),
                reason: "broker unreachable".to_string(),
            });
        }
        let payload = String::from_utf8(payload).unwrap();
        self.sent.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }
}

/// Replays scripted captures in order, then reports itself unavailable.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<DeviceSet, SourceError>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, devices: &[&str]) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(devices.iter().collect()));
        self
    }

    pub fn then_fail(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(SourceError::Unavailable("arp: command not found".into())));
        self
    }
}

impl SnapshotSource for ScriptedSource {
    async fn capture(&self) -> Result<DeviceSet, SourceError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Unavailable("script exhausted".into())))
    }

    async fn local_ip(&self) -> Result<String, SourceError> {
        Ok("192.168.1.10".to_string())
    }

    async fn local_mac(&self) -> Result<String, SourceError> {
        Ok("de:ad:be:ef:00:01".to_string())
    }
}
