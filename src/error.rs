use std::time::Duration;

use thiserror::Error;

/// Failures reading the neighbor table or the local host's addresses.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("address source unavailable: {0}")]
    Unavailable(String),

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("unable to connect to MQTT broker: {0}")]
    ConnectFailed(String),

    #[error("unable to subscribe to topic {topic}: {reason}")]
    SubscribeFailed { topic: String, reason: String },

    #[error("unable to publish to topic {topic}: {reason}")]
    PublishFailed { topic: String, reason: String },
}
