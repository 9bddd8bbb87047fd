//! MQTT transport wiring.
//!
//! The rest of the crate never touches the MQTT client: the ingestor reads
//! plain [`InboundMessage`]s from a channel, and the dispatcher publishes
//! through the [`CommandSink`] trait. This module pins both to rumqttc.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use solarlink_core::topics;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatch::{CommandSink, DispatchError};
use crate::ingest::InboundMessage;

/// Connection settings for the MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

/// Outbound publisher handle backed by the shared MQTT client.
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
}

impl CommandSink for MqttSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), DispatchError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

/// Connect to the broker and start pumping inbound device messages into the
/// channel. Returns the publisher handle and the pump task.
pub fn connect(
    config: &MqttConfig,
    namespace: String,
    inbound_tx: mpsc::Sender<InboundMessage>,
) -> (MqttSink, JoinHandle<()>) {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.host.clone(),
        config.port,
    );
    options.set_keep_alive(Duration::from_secs(30));
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        options.set_credentials(user.clone(), pass.clone());
    }

    let (client, event_loop) = AsyncClient::new(options, 64);

    let pump = tokio::spawn(pump_events(client.clone(), event_loop, namespace, inbound_tx));

    (MqttSink { client }, pump)
}

/// Drive the MQTT event loop: (re)subscribe on every connection, forward
/// publishes, and back off briefly on connection errors.
async fn pump_events(
    client: AsyncClient,
    mut event_loop: EventLoop,
    namespace: String,
    inbound_tx: mpsc::Sender<InboundMessage>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                let filters = [
                    topics::status_filter(&namespace),
                    topics::online_filter(&namespace),
                ];
                for filter in filters {
                    if let Err(e) = client.subscribe(&filter, QoS::AtMostOnce).await {
                        warn!(filter = %filter, error = %e, "MQTT subscribe failed");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if inbound_tx.send(message).await.is_err() {
                    info!("Ingest channel closed, stopping MQTT pump");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "MQTT connection error, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
