use crate::api::waiter;
use crate::clients::{BroadcastSink, WebhookSink};
use crate::config::Config;
use crate::lifecycle::connect_broker;
use crate::model::NotificationEvent;
use crate::waiter::{OrderReadyConsumer, WaiterService};
use anyhow::{Context, Result};
use axum::Router;
use relay_framework::{FanOutActor, FanOutClient, FanOutReceiver, Sink, DEFAULT_HISTORY_CAPACITY};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

const FANOUT_BUFFER: usize = 64;
const BROADCAST_CAPACITY: usize = 128;

/// The waiter role: a broker subscription feeding the fan-out actor, whose history and
/// live broadcast back the waiter HTTP surface.
pub struct WaiterSystem {
    pub service: WaiterService,
    client: FanOutClient<NotificationEvent>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WaiterSystem {
    /// Subscribes to the order-ready subject in the configured consumer group.
    pub async fn start(config: Config) -> Result<Self> {
        let client = connect_broker(&config.nats_url).await?;
        let subscriber = client
            .queue_subscribe(config.order_ready_subject.clone(), config.waiter_group.clone())
            .await
            .with_context(|| format!("cannot subscribe to {}", config.order_ready_subject))?;
        info!(subject = %config.order_ready_subject, group = %config.waiter_group, "Subscribed");

        let broadcast = BroadcastSink::new(config.broadcast_channel.as_str(), BROADCAST_CAPACITY);
        let mut sinks: Vec<Arc<dyn Sink<NotificationEvent>>> = vec![Arc::new(broadcast.clone())];
        match &config.webhook_url {
            Some(url) => sinks.push(Arc::new(
                WebhookSink::new(url.as_str(), config.webhook_timeout).context("cannot build webhook client")?,
            )),
            None => info!("WEBHOOK_URL not set, webhook sink disabled"),
        }

        Ok(Self::with_parts(broadcast, sinks, subscriber))
    }

    /// Spawns the fan-out actor over `sinks` and a consumer over `messages`.
    ///
    /// `broadcast` must be one of `sinks` for `/stream` to see anything.
    pub fn with_parts<S>(broadcast: BroadcastSink, sinks: Vec<Arc<dyn Sink<NotificationEvent>>>, messages: S) -> Self
    where
        S: futures::Stream<Item = async_nats::Message> + Send + 'static,
    {
        let receiver = Arc::new(FanOutReceiver::new(DEFAULT_HISTORY_CAPACITY, sinks));
        let (actor, client) = FanOutActor::new(receiver.clone(), FANOUT_BUFFER);
        let actor_handle = tokio::spawn(actor.run());

        let running = Arc::new(AtomicBool::new(false));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let consumer = OrderReadyConsumer::new(client.clone(), receiver.clone(), running.clone());
        let consumer_handle = tokio::spawn(consumer.run(messages, shutdown_rx));

        Self {
            service: WaiterService::new(receiver, broadcast, running),
            client,
            shutdown,
            handles: vec![consumer_handle, actor_handle],
        }
    }

    /// In-process entry to the fan-out actor, bypassing the broker.
    pub fn client(&self) -> FanOutClient<NotificationEvent> {
        self.client.clone()
    }

    pub fn router(&self) -> Router {
        waiter::router(self.service.clone())
    }

    /// Stops consuming, then lets the actor drain and exit.
    ///
    /// Clones handed out by [`WaiterSystem::client`] must be dropped first, or the actor
    /// never sees its channel close.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down waiter system...");

        // The consumer holds a client too; it drops it when it exits.
        let _ = self.shutdown.send(true);
        drop(self.client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Waiter task failed: {:?}", e);
                anyhow::bail!("Waiter task failed: {:?}", e);
            }
        }

        info!("Waiter system shutdown complete.");
        Ok(())
    }
}
