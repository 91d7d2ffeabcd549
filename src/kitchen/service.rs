use crate::clients::OrderUpstream;
use crate::error::OrderError;
use crate::kitchen::StatusCoordinator;
use crate::model::{AuthContext, CacheEntrySet, OrderId, OrderSnapshot, OrderStatus};
use relay_framework::TieredCache;
use std::sync::Arc;
use tracing::instrument;

/// What the kitchen HTTP surface talks to.
///
/// Reads come from the cache and never touch the upstream. Writes go through the
/// [`StatusCoordinator`].
#[derive(Clone)]
pub struct KitchenService {
    cache: TieredCache<CacheEntrySet>,
    coordinator: StatusCoordinator,
    upstream: Arc<dyn OrderUpstream>,
}

impl KitchenService {
    pub fn new(
        cache: TieredCache<CacheEntrySet>,
        coordinator: StatusCoordinator,
        upstream: Arc<dyn OrderUpstream>,
    ) -> Self {
        Self {
            cache,
            coordinator,
            upstream,
        }
    }

    /// Cached active orders, ordered by id. Never fails.
    pub async fn active_orders(&self) -> Vec<OrderSnapshot> {
        self.cache.read().await.values().cloned().collect()
    }

    pub async fn transition(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        auth: &AuthContext,
    ) -> Result<OrderSnapshot, OrderError> {
        self.coordinator.transition(order_id, target, auth).await
    }

    /// Direct upstream round trip for the debug endpoint. Bypasses the cache.
    #[instrument(skip(self))]
    pub async fn probe_upstream(&self) -> Result<usize, OrderError> {
        self.upstream.list_active_orders().await.map(|orders| orders.len())
    }

    pub fn cache_tiers(&self) -> Vec<&'static str> {
        self.cache.tier_names()
    }
}
