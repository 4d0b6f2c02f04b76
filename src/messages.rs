/// Signals received from the broker, forwarded out of the MQTT event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusAnnouncement {
    NewDevice(/* raw payload */ String),
}
