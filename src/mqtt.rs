use std::time::Duration;

use log::{debug, error, info, warn};
use rumqttc::{ConnectReturnCode, Event, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode};
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::config;
use crate::error::BusError;
use crate::messages::BusAnnouncement;
use crate::notifier::{MessageBus, Topics};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct MqttClient {
    client: rumqttc::AsyncClient,
    topics: Topics,
}

impl MqttClient {
    pub fn new(config: &config::MqttConfig) -> (Self, rumqttc::EventLoop) {
        let publisher_id = config
            .publisher_id
            .clone()
            .unwrap_or_else(|| config::DEFAULT_PUBLISHER_ID.to_string());

        let mut mqttoptions = MqttOptions::new(
            publisher_id,
            config.host.clone(),
            config.port.unwrap_or(config::DEFAULT_MQTT_PORT),
        );

        mqttoptions.set_keep_alive(Duration::from_secs(
            config
                .keep_alive_seconds
                .unwrap_or(config::DEFAULT_KEEP_ALIVE_SECONDS),
        ));

        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            mqttoptions.set_credentials(username.clone(), password.clone());
        }

        let (client, eventloop) = rumqttc::AsyncClient::new(mqttoptions, 10);

        (
            MqttClient {
                client,
                topics: Topics::new(config.topic_path()),
            },
            eventloop,
        )
    }

    /// Creates the client and waits until the broker has accepted both the
    /// connection and the `new_device` subscription.
    pub async fn connect(
        config: &config::MqttConfig,
    ) -> Result<(Self, rumqttc::EventLoop), BusError> {
        let (client, mut eventloop) = Self::new(config);
        client.subscribe().await?;

        let limit = config.connect_timeout();
        timeout(limit, client.await_session(&mut eventloop))
            .await
            .map_err(|_| {
                BusError::ConnectFailed(format!(
                    "no answer from {} within {limit:?}",
                    config.host
                ))
            })??;

        info!("Connected to MQTT broker at {}", config.host);
        Ok((client, eventloop))
    }

    async fn await_session(&self, eventloop: &mut rumqttc::EventLoop) -> Result<(), BusError> {
        let mut connected = false;
        loop {
            let event = eventloop.poll().await.map_err(|err| {
                if connected {
                    self.subscribe_failed(err.to_string())
                } else {
                    BusError::ConnectFailed(err.to_string())
                }
            })?;

            match event {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(BusError::ConnectFailed(format!("{:?}", ack.code)));
                    }
                    debug!("Connection acknowledged");
                    connected = true;
                }
                Event::Incoming(Packet::SubAck(ack)) => {
                    if ack
                        .return_codes
                        .iter()
                        .any(|code| matches!(code, SubscribeReasonCode::Failure))
                    {
                        return Err(self.subscribe_failed("rejected by broker".to_string()));
                    }
                    debug!("Subscription acknowledged");
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    fn subscribe_failed(&self, reason: String) -> BusError {
        BusError::SubscribeFailed {
            topic: self.topics.new_device.clone(),
            reason,
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub async fn subscribe(&self) -> Result<(), BusError> {
        self.client
            .subscribe(self.topics.new_device.clone(), QoS::AtMostOnce)
            .await
            .map_err(|err| self.subscribe_failed(err.to_string()))
    }

    /// Drives the connection until the client disconnects, forwarding
    /// `new_device` messages to `tx`.
    pub async fn event_loop(
        &self,
        eventloop: &mut rumqttc::EventLoop,
        tx: broadcast::Sender<BusAnnouncement>,
    ) {
        loop {
            match eventloop.poll().await {
                Ok(notification) => match notification {
                    Event::Incoming(Packet::Publish(p)) => {
                        let payload = String::from_utf8_lossy(&p.payload).into_owned();
                        info!("Message received on topic: {}. Message: {}", p.topic, payload);

                        if p.topic != self.topics.new_device {
                            continue;
                        }
                        if let Err(err) = tx.send(BusAnnouncement::NewDevice(payload)) {
                            error!("Error announcing new device: {:?}", err);
                        }
                    }
                    Event::Incoming(Packet::SubAck(_)) => {
                        debug!("Subscription acknowledged");
                    }
                    Event::Incoming(Packet::ConnAck(_)) => {
                        info!("Reconnected to MQTT broker");
                        if let Err(err) = self.subscribe().await {
                            error!("Error subscribing to MQTT topics: {}", err);
                        }
                    }
                    Event::Outgoing(Outgoing::Disconnect) => {
                        debug!("Disconnect sent");
                        break;
                    }
                    _ => {}
                },
                Err(e) => {
                    warn!("Error polling MQTT event loop: {}", e);
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                }
            }
        }
    }

    pub async fn disconnect(&self) -> Result<(), rumqttc::ClientError> {
        debug!("Disconnecting MQTT client");
        self.client.disconnect().await
    }
}

impl MessageBus for MqttClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|err| BusError::PublishFailed {
                topic: topic.to_string(),
                reason: err.to_string(),
            })
    }
}
