//! # Order-Ready Consumer
//!
//! Bridges the broker subscription to the [`FanOutActor`](relay_framework::FanOutActor).
//! Each message is counted and its raw payload kept for diagnostics before decoding. A
//! payload that does not decode is recorded as an error and dropped; it is never sent
//! back to the broker for redelivery.

use crate::clients::broker;
use crate::model::NotificationEvent;
use futures::StreamExt;
use relay_framework::{FanOutClient, FanOutReceiver, FanOutReport, FrameworkError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("Undecodable notification: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Receiver(#[from] FrameworkError),
}

pub struct OrderReadyConsumer {
    client: FanOutClient<NotificationEvent>,
    receiver: Arc<FanOutReceiver<NotificationEvent>>,
    running: Arc<AtomicBool>,
}

impl OrderReadyConsumer {
    pub fn new(
        client: FanOutClient<NotificationEvent>,
        receiver: Arc<FanOutReceiver<NotificationEvent>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            receiver,
            running,
        }
    }

    /// Handles one raw broker payload.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<FanOutReport, ConsumeError> {
        let diagnostics = self.receiver.diagnostics();
        diagnostics.record_message();
        diagnostics.record_raw(String::from_utf8_lossy(payload));

        let result = match broker::decode(payload) {
            Ok(event) => self.client.deliver(event).await.map_err(ConsumeError::from),
            Err(e) => Err(ConsumeError::from(e)),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Notification dropped");
            diagnostics.record_error(e);
        }
        result
    }

    /// Consumes `messages` until the stream ends or `shutdown` flips to `true`.
    pub async fn run<S>(self, messages: S, mut shutdown: watch::Receiver<bool>)
    where
        S: futures::Stream<Item = async_nats::Message>,
    {
        let mut messages = std::pin::pin!(messages);
        self.running.store(true, Ordering::Release);
        info!("Order-ready consumer started");

        loop {
            tokio::select! {
                message = messages.next() => {
                    let Some(message) = message else {
                        warn!("Broker subscription ended");
                        break;
                    };
                    debug!(subject = %message.subject, bytes = message.payload.len(), "Message received");
                    let _ = self.handle_payload(&message.payload).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.running.store(false, Ordering::Release);
        info!(
            messages = self.receiver.diagnostics().message_count(),
            "Order-ready consumer shutdown"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderId, TableId};
    use relay_framework::mock::MockSink;
    use relay_framework::{FanOutActor, Sink};

    fn pipeline() -> (OrderReadyConsumer, Arc<FanOutReceiver<NotificationEvent>>, Arc<MockSink<NotificationEvent>>) {
        let sink = Arc::new(MockSink::recording("broadcast"));
        let sinks: Vec<Arc<dyn Sink<NotificationEvent>>> = vec![sink.clone()];
        let receiver = Arc::new(FanOutReceiver::new(50, sinks));
        let (actor, client) = FanOutActor::new(receiver.clone(), 8);
        tokio::spawn(actor.run());
        let consumer = OrderReadyConsumer::new(client, receiver.clone(), Arc::new(AtomicBool::new(false)));
        (consumer, receiver, sink)
    }

    #[tokio::test]
    async fn test_valid_payload_is_fanned_out() {
        let (consumer, receiver, sink) = pipeline();
        let event = NotificationEvent::new(OrderId(4), TableId(2), vec![]);
        let payload = broker::encode(&event).unwrap();

        let report = consumer.handle_payload(&payload).await.unwrap();

        assert_eq!(report.delivered, vec!["broadcast".to_string()]);
        assert_eq!(sink.received(), vec![event.clone()]);
        assert_eq!(receiver.history(), vec![event]);
        assert_eq!(receiver.diagnostics().message_count(), 1);
        assert_eq!(receiver.diagnostics().raw_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_recorded_not_delivered() {
        let (consumer, receiver, sink) = pipeline();

        let result = consumer.handle_payload(b"{not json").await;

        assert!(matches!(result, Err(ConsumeError::Decode(_))));
        assert!(sink.received().is_empty());
        assert!(receiver.history().is_empty());
        assert_eq!(receiver.diagnostics().message_count(), 1);
        assert_eq!(receiver.diagnostics().raw_messages(), vec!["{not json".to_string()]);
        assert_eq!(receiver.diagnostics().errors().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (consumer, _receiver, _sink) = pipeline();
        let running = consumer.running.clone();
        let (tx, rx) = watch::channel(false);
        let messages = futures::stream::pending::<async_nats::Message>();

        let handle = tokio::spawn(consumer.run(messages, rx));
        tokio::task::yield_now().await;

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(!running.load(Ordering::Acquire));
    }
}
