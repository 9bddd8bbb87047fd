//! Telemetry ingestor: classifies inbound device messages and updates the
//! status cache, pairing ledger, and telemetry history.
//!
//! Registry writes on this path are best-effort side effects: a storage
//! failure is logged and dropped so the transport subscription never stalls
//! or disconnects because of the database.

use solarlink_core::telemetry::{self, StatusPayload};
use solarlink_core::topics::{DeviceTopic, TopicKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{PairingLedger, StatusCache};
use crate::storage::CloudDatabase;

/// One raw inbound transport message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Clone)]
pub struct TelemetryIngestor {
    namespace: String,
    statuses: StatusCache,
    codes: PairingLedger,
    db: CloudDatabase,
}

impl TelemetryIngestor {
    pub const fn new(
        namespace: String,
        statuses: StatusCache,
        codes: PairingLedger,
        db: CloudDatabase,
    ) -> Self {
        Self {
            namespace,
            statuses,
            codes,
            db,
        }
    }

    /// Consume inbound messages until the channel closes. No message, well
    /// formed or not, may break this loop.
    pub async fn run(self, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = rx.recv().await {
            self.handle_message(&message.topic, &message.payload).await;
        }
        info!("Telemetry channel closed, ingestor stopping");
    }

    /// Process one message. Unknown topics are ignored; malformed payloads
    /// are logged and dropped.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) {
        let Some(parsed) = DeviceTopic::parse(&self.namespace, topic) else {
            debug!(topic = %topic, "Ignoring message on unexpected topic");
            return;
        };

        match parsed.kind {
            TopicKind::Status => self.handle_status(&parsed.device_id, payload).await,
            TopicKind::Online => self.handle_online(&parsed.device_id, payload).await,
        }
    }

    async fn handle_status(&self, device_id: &str, payload: &[u8]) {
        let status = match StatusPayload::parse(payload) {
            Ok(status) => status,
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Dropping malformed status payload");
                return;
            }
        };

        if let Some(code) = &status.confirmation_code {
            self.codes.put(device_id, code).await;
            info!(device_id = %device_id, "Received confirmation code");
        }

        self.statuses.record_status(device_id, &status).await;

        // History only for devices some user has claimed; never fatal.
        match self.db.device_exists(device_id).await {
            Ok(true) => {
                if let Err(e) = self.db.append_history(device_id, &status).await {
                    warn!(device_id = %device_id, error = %e, "Failed to append device history");
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Device lookup failed, skipping history");
            }
        }
    }

    async fn handle_online(&self, device_id: &str, payload: &[u8]) {
        let Some(online) = telemetry::parse_online_literal(payload) else {
            warn!(device_id = %device_id, "Dropping malformed online payload");
            return;
        };

        self.statuses.set_online(device_id, online).await;
    }
}

#[cfg(test)]
mod tests;
