use crate::clients::BroadcastSink;
use crate::model::NotificationEvent;
use relay_framework::{Diagnostics, FanOutReceiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Read-side handle over the waiter pipeline, shared with the HTTP surface.
#[derive(Clone)]
pub struct WaiterService {
    receiver: Arc<FanOutReceiver<NotificationEvent>>,
    broadcast: BroadcastSink,
    listener_running: Arc<AtomicBool>,
}

impl WaiterService {
    pub fn new(
        receiver: Arc<FanOutReceiver<NotificationEvent>>,
        broadcast: BroadcastSink,
        listener_running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            receiver,
            broadcast,
            listener_running,
        }
    }

    /// Recently received notifications, most recent first.
    pub fn received_orders(&self) -> Vec<NotificationEvent> {
        self.receiver.history()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.receiver.diagnostics()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.broadcast.subscribe()
    }

    pub fn broadcast_channel(&self) -> &str {
        self.broadcast.channel()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.receiver.sink_names()
    }

    pub fn is_listener_running(&self) -> bool {
        self.listener_running.load(Ordering::Acquire)
    }
}
