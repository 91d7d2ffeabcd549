use crate::api::kitchen::{self, KitchenState};
use crate::clients::{HttpOrderUpstream, NatsKvTier, NatsPublisher, OrderUpstream};
use crate::config::Config;
use crate::kitchen::{ActiveOrdersSource, KitchenService, StatusCoordinator};
use crate::lifecycle::connect_broker;
use crate::model::{CacheEntrySet, NotificationEvent};
use anyhow::Result;
use axum::Router;
use relay_framework::{CacheTier, LocalTier, Poller, Publisher, TieredCache};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The kitchen role: a background poller keeping the order cache fresh, and the status
/// coordinator behind the kitchen HTTP surface.
///
/// # Example
///
/// ```ignore
/// let system = KitchenSystem::start(Config::from_env()?).await?;
/// axum::serve(listener, system.router()).await?;
/// system.shutdown().await?;
/// ```
pub struct KitchenSystem {
    pub service: KitchenService,
    pub config: Arc<Config>,
    shutdown: watch::Sender<bool>,
    poller_handle: JoinHandle<()>,
}

impl KitchenSystem {
    /// Connects to the broker and the upstream and starts polling.
    pub async fn start(config: Config) -> Result<Self> {
        let client = connect_broker(&config.nats_url).await?;
        let upstream: Arc<dyn OrderUpstream> = Arc::new(HttpOrderUpstream::new(
            config.order_service_base_url.as_str(),
            config.upstream_timeout,
        )?);
        let publisher: Arc<dyn Publisher<NotificationEvent>> = Arc::new(NatsPublisher::new(
            client.clone(),
            config.order_ready_subject.as_str(),
            config.upstream_timeout,
        ));
        let tiers = cache_tiers(&config, client).await;

        Ok(Self::with_parts(config, upstream, publisher, tiers))
    }

    /// Wires the role from ready-made parts and spawns the poller.
    ///
    /// `tiers` are read in the order given.
    pub fn with_parts(
        config: Config,
        upstream: Arc<dyn OrderUpstream>,
        publisher: Arc<dyn Publisher<NotificationEvent>>,
        tiers: Vec<Arc<dyn CacheTier<CacheEntrySet>>>,
    ) -> Self {
        let cache = TieredCache::new(tiers, config.cache_read_timeout);
        let source = Arc::new(ActiveOrdersSource::new(upstream.clone()));
        let poller = Poller::new(source, cache.clone(), config.poll_interval, config.upstream_timeout);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let poller_handle = tokio::spawn(poller.run(shutdown_rx));

        let coordinator = StatusCoordinator::new(upstream.clone(), publisher, config.upstream_timeout);
        info!(tiers = ?cache.tier_names(), "Kitchen system started");

        Self {
            service: KitchenService::new(cache, coordinator, upstream),
            config: Arc::new(config),
            shutdown,
            poller_handle,
        }
    }

    pub fn router(&self) -> Router {
        kitchen::router(KitchenState {
            service: self.service.clone(),
            config: self.config.clone(),
        })
    }

    /// Stops the poller and waits for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down kitchen system...");
        let _ = self.shutdown.send(true);

        if let Err(e) = self.poller_handle.await {
            error!("Poller task failed: {:?}", e);
            anyhow::bail!("Poller task failed: {:?}", e);
        }

        info!("Kitchen system shutdown complete.");
        Ok(())
    }
}

/// Distributed tier first when enabled, then the local tier.
///
/// A distributed tier that cannot be opened at startup is left out; the kitchen runs on
/// the local tier alone.
async fn cache_tiers(config: &Config, client: async_nats::Client) -> Vec<Arc<dyn CacheTier<CacheEntrySet>>> {
    let mut tiers: Vec<Arc<dyn CacheTier<CacheEntrySet>>> = Vec::new();
    if config.cache_distributed_enabled {
        let opened = tokio::time::timeout(config.upstream_timeout, NatsKvTier::connect(client, &config.cache_bucket)).await;
        match opened {
            Ok(Ok(tier)) => tiers.push(Arc::new(tier)),
            Ok(Err(e)) => warn!(error = %e, "Distributed cache tier disabled"),
            Err(_) => warn!(bucket = %config.cache_bucket, "Distributed cache tier disabled, broker did not answer"),
        }
    }
    tiers.push(Arc::new(LocalTier::new()));
    tiers
}
