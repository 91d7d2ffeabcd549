use crate::model::NotificationEvent;
use async_trait::async_trait;
use relay_framework::{FrameworkError, Sink};
use tokio::sync::broadcast;
use tracing::debug;

/// Live-broadcast channel for connected clients.
///
/// Fire-and-forget: with nobody subscribed the event is simply dropped, and a slow
/// subscriber lags rather than holding up delivery.
#[derive(Clone)]
pub struct BroadcastSink {
    channel: String,
    sender: broadcast::Sender<NotificationEvent>,
}

impl BroadcastSink {
    pub fn new(channel: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            channel: channel.into(),
            sender,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Subscribes a live client to future broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Sink<NotificationEvent> for BroadcastSink {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn deliver(&self, event: &NotificationEvent) -> Result<(), FrameworkError> {
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        debug!(channel = %self.channel, receivers, order_id = %event.order_id, "Broadcast sent");
        Ok(())
    }
}
