//! Command dispatcher: publishes operator commands to device command topics.
//!
//! Fire-and-forget: the transport offers no delivery acknowledgment, so
//! success means "accepted for publish", not "device executed command".

use serde_json::Value;
use solarlink_core::telemetry::CommandPayload;
use solarlink_core::topics;
use tracing::info;

/// Outbound half of the transport, as seen by the dispatcher.
///
/// The MQTT client implements this in [`crate::transport`]; tests substitute
/// a recording sink.
pub trait CommandSink: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Command serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Transport rejected publish: {0}")]
    Transport(String),
}

pub struct CommandDispatcher<S> {
    namespace: String,
    sink: S,
}

impl<S: CommandSink> CommandDispatcher<S> {
    pub const fn new(namespace: String, sink: S) -> Self {
        Self { namespace, sink }
    }

    /// Publish a command to the device's command topic. Callers must have
    /// passed the access controller's authorization check first.
    pub async fn send(
        &self,
        device_identifier: &str,
        command: &str,
        state: Value,
    ) -> Result<(), DispatchError> {
        let payload = CommandPayload {
            command: command.to_string(),
            state,
        };
        let bytes = serde_json::to_vec(&payload)?;
        let topic = topics::command_topic(&self.namespace, device_identifier);

        self.sink.publish(&topic, bytes).await?;

        info!(device_id = %device_identifier, command = %command, "Command dispatched");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl CommandSink for &RecordingSink {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), DispatchError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    #[tokio::test]
    async fn publishes_to_command_topic() {
        let sink = RecordingSink::default();
        let dispatcher = CommandDispatcher::new("solar".to_string(), &sink);

        dispatcher.send("D1", "setRelay", json!(true)).await.unwrap();

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "solar/D1/command");
        assert_eq!(published[0].1, br#"{"command":"setRelay","state":true}"#);
    }
}
