use crate::clients::OrderUpstream;
use crate::error::OrderError;
use crate::model::{entry_set, CacheEntrySet};
use async_trait::async_trait;
use relay_framework::PollSource;
use std::sync::Arc;
use tracing::debug;

/// Feeds the poller with the upstream's active orders.
///
/// One bad record (unknown status, bad quantity) fails the whole fetch, so the poller
/// keeps the previous set instead of caching a partial one.
pub struct ActiveOrdersSource {
    upstream: Arc<dyn OrderUpstream>,
}

impl ActiveOrdersSource {
    pub fn new(upstream: Arc<dyn OrderUpstream>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl PollSource for ActiveOrdersSource {
    type Output = CacheEntrySet;
    type Error = OrderError;

    async fn fetch(&self) -> Result<CacheEntrySet, OrderError> {
        let snapshots = self.upstream.list_active_orders().await?;
        let entries = entry_set(snapshots);
        debug!(size = entries.len(), "Active orders fetched");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockUpstream;
    use crate::model::{OrderId, OrderSnapshot, OrderStatus, TableId};
    use chrono::Utc;

    #[tokio::test]
    async fn test_fetch_keys_entries_by_order_id() {
        let mut upstream = MockUpstream::new();
        upstream.expect_list().return_ok(vec![
            OrderSnapshot::new(OrderId(2), TableId(102), OrderStatus::Preparing, vec![], Utc::now()),
            OrderSnapshot::new(OrderId(1), TableId(101), OrderStatus::Created, vec![], Utc::now()),
        ]);
        let source = ActiveOrdersSource::new(Arc::new(upstream));

        let entries = source.fetch().await.unwrap();
        assert_eq!(entries.keys().copied().collect::<Vec<_>>(), vec![OrderId(1), OrderId(2)]);
    }

    #[tokio::test]
    async fn test_fetch_propagates_upstream_failure() {
        let mut upstream = MockUpstream::new();
        upstream
            .expect_list()
            .return_err(OrderError::UnknownStatus("SERVED".to_string()));
        let source = ActiveOrdersSource::new(Arc::new(upstream));

        assert!(matches!(source.fetch().await, Err(OrderError::UnknownStatus(_))));
    }
}
