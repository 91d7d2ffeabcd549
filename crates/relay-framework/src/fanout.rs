//! # Fan-out Receiver
//!
//! This module turns one inbound event into a history entry plus one delivery per
//! [`Sink`]. It is split the same way the rest of the framework is:
//!
//! - [`FanOutReceiver`] is the pure logic: `on_event(event)` inserts into the
//!   [`HistoryBuffer`] and then calls each sink. It takes `&self` and can be driven by any
//!   runtime.
//! - [`FanOutActor`] is the "server" half: it owns the receiving end of a channel and feeds
//!   events to the receiver one at a time.
//! - [`FanOutClient`] is the cheap, cloneable "client" half handed to broker consumers.
//!
//! ## Failure isolation
//!
//! The history insert happens first and is never undone. Each sink is delivered in its own
//! task, so an error *or a panic* in one sink is recorded in [`Diagnostics`] and the next
//! sink still runs. Nothing is reported back to the broker as a redelivery request.

use crate::error::FrameworkError;
use crate::history::HistoryBuffer;
use crate::sink::Sink;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Diagnostic record kept by a receiver.
///
/// Errors and raw messages are bounded like the history itself, most recent first.
pub struct Diagnostics {
    message_count: AtomicU64,
    errors: HistoryBuffer<String>,
    raw_messages: HistoryBuffer<String>,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            message_count: AtomicU64::new(0),
            errors: HistoryBuffer::new(capacity),
            raw_messages: HistoryBuffer::new(capacity),
        }
    }

    /// Counts one inbound message, decodable or not.
    pub fn record_message(&self) {
        self.message_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_raw(&self, raw: impl Into<String>) {
        self.raw_messages.push(raw.into());
    }

    pub fn record_error(&self, error: impl ToString) {
        self.errors.push(error.to_string());
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.snapshot()
    }

    pub fn raw_messages(&self) -> Vec<String> {
        self.raw_messages.snapshot()
    }
}

/// Which sinks accepted an event and which failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

/// Inserts events into a bounded history and forwards them to independent sinks.
pub struct FanOutReceiver<E> {
    history: HistoryBuffer<E>,
    sinks: Vec<Arc<dyn Sink<E>>>,
    diagnostics: Diagnostics,
}

impl<E> FanOutReceiver<E>
where
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Creates a receiver with a history of `capacity` events.
    ///
    /// Sinks are called in the order given.
    pub fn new(capacity: usize, sinks: Vec<Arc<dyn Sink<E>>>) -> Self {
        Self {
            history: HistoryBuffer::new(capacity),
            sinks,
            diagnostics: Diagnostics::new(capacity),
        }
    }

    /// Handles one delivered event.
    pub async fn on_event(&self, event: E) -> FanOutReport {
        debug!(?event, "Event received");
        self.history.push(event.clone());

        let mut report = FanOutReport::default();
        for sink in &self.sinks {
            let name = sink.name().to_string();
            let task_sink = sink.clone();
            let task_event = event.clone();
            let outcome = tokio::spawn(async move { task_sink.deliver(&task_event).await }).await;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(join_error) => Some(FrameworkError::sink(&name, join_error)),
            };
            match failure {
                None => report.delivered.push(name),
                Some(e) => {
                    warn!(sink = %name, error = %e, "Sink delivery failed");
                    self.diagnostics.record_error(&e);
                    report.failed.push(name);
                }
            }
        }

        info!(
            history = self.history.len(),
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Event fanned out"
        );
        report
    }

    /// Recent events, most recent first.
    pub fn history(&self) -> Vec<E> {
        self.history.snapshot()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }
}

/// Message sent from a [`FanOutClient`] to its [`FanOutActor`].
#[derive(Debug)]
pub struct FanOutRequest<E> {
    pub event: E,
    pub respond_to: oneshot::Sender<FanOutReport>,
}

/// Drives a [`FanOutReceiver`] from a channel, one event at a time.
pub struct FanOutActor<E> {
    receiver: mpsc::Receiver<FanOutRequest<E>>,
    fanout: Arc<FanOutReceiver<E>>,
}

impl<E> FanOutActor<E>
where
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Creates the actor and its client.
    ///
    /// `buffer_size` is the channel capacity; when it is full, `deliver` waits.
    pub fn new(fanout: Arc<FanOutReceiver<E>>, buffer_size: usize) -> (Self, FanOutClient<E>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver, fanout }, FanOutClient { sender })
    }

    /// Processes events until every client has been dropped.
    pub async fn run(mut self) {
        info!(sinks = ?self.fanout.sink_names(), "Fan-out actor started");

        while let Some(FanOutRequest { event, respond_to }) = self.receiver.recv().await {
            let report = self.fanout.on_event(event).await;
            let _ = respond_to.send(report);
        }

        info!(history = self.fanout.history.len(), "Fan-out actor shutdown");
    }
}

/// Cloneable handle used by consumers to hand events to a [`FanOutActor`].
pub struct FanOutClient<E> {
    sender: mpsc::Sender<FanOutRequest<E>>,
}

impl<E> Clone for FanOutClient<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> FanOutClient<E> {
    pub async fn deliver(&self, event: E) -> Result<FanOutReport, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(FanOutRequest { event, respond_to })
            .await
            .map_err(|_| FrameworkError::ReceiverClosed)?;
        response.await.map_err(|_| FrameworkError::ReceiverDropped)
    }
}
