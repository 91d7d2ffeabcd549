use crate::model::NotificationEvent;
use async_trait::async_trait;
use bytes::Bytes;
use relay_framework::{FrameworkError, Publisher};
use std::time::Duration;
use tracing::{debug, instrument};

/// Publishes ready notifications as JSON on a NATS subject.
///
/// The publish is flushed before returning, within `timeout`, so the coordinator learns
/// about an unreachable broker instead of buffering silently.
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
    subject: String,
    timeout: Duration,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client, subject: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            subject: subject.into(),
            timeout,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[async_trait]
impl Publisher<NotificationEvent> for NatsPublisher {
    #[instrument(skip_all, fields(order_id = %event.order_id, subject = %self.subject))]
    async fn publish(&self, event: &NotificationEvent) -> Result<(), FrameworkError> {
        let payload = encode(event)?;
        let send = async {
            self.client
                .publish(self.subject.clone(), payload)
                .await
                .map_err(|e| FrameworkError::PublishFailed(e.to_string()))?;
            self.client
                .flush()
                .await
                .map_err(|e| FrameworkError::PublishFailed(e.to_string()))
        };
        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                FrameworkError::PublishFailed(format!(
                    "broker did not confirm within {}ms",
                    self.timeout.as_millis()
                ))
            })??;
        debug!("Notification published");
        Ok(())
    }
}

/// Wire encoding shared by the publisher and the waiter-side consumer.
pub fn encode(event: &NotificationEvent) -> Result<Bytes, FrameworkError> {
    serde_json::to_vec(event)
        .map(Bytes::from)
        .map_err(|e| FrameworkError::PublishFailed(format!("encode: {}", e)))
}

pub fn decode(payload: &[u8]) -> Result<NotificationEvent, serde_json::Error> {
    serde_json::from_slice(payload)
}
