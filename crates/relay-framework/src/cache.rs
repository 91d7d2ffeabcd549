//! # Tiered Cache
//!
//! [`TieredCache`] stacks [`CacheTier`]s in priority order. Reads walk the tiers from the
//! highest priority down and return the first value found; any tier failure (error or
//! timeout) is logged and the next tier is tried. If no tier yields a value, the read
//! returns `V::default()`. Reads therefore never fail.
//!
//! Writes replace the value in every tier. A failing tier is logged and skipped so the
//! remaining tiers still receive the new value. A tier whose last write failed is marked
//! stale and left out of reads until a later write to it succeeds, so an older value in a
//! higher tier never shadows a newer one below it.
//!
//! ```rust
//! use relay_framework::{LocalTier, TieredCache};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache: TieredCache<BTreeMap<u64, String>> =
//!         TieredCache::new(vec![Arc::new(LocalTier::new())], Duration::from_millis(100));
//!
//!     assert!(cache.read().await.is_empty());
//!
//!     cache.write(BTreeMap::from([(1, "soup".to_string())])).await;
//!     assert_eq!(cache.read().await.len(), 1);
//! }
//! ```

use crate::error::FrameworkError;
use crate::tier::CacheTier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A read-mostly cache over several storage tiers.
pub struct TieredCache<V> {
    tiers: Vec<Arc<dyn CacheTier<V>>>,
    /// One flag per tier, set while the tier missed the latest write.
    stale: Arc<[AtomicBool]>,
    tier_timeout: Duration,
}

impl<V> Clone for TieredCache<V> {
    fn clone(&self) -> Self {
        Self {
            tiers: self.tiers.clone(),
            stale: self.stale.clone(),
            tier_timeout: self.tier_timeout,
        }
    }
}

impl<V> TieredCache<V>
where
    V: Default + Send + Sync + 'static,
{
    /// Creates a cache over `tiers`, highest priority first.
    ///
    /// `tier_timeout` bounds every individual tier access.
    pub fn new(tiers: Vec<Arc<dyn CacheTier<V>>>, tier_timeout: Duration) -> Self {
        let stale = tiers.iter().map(|_| AtomicBool::new(false)).collect();
        Self {
            tiers,
            stale,
            tier_timeout,
        }
    }

    /// Names of the configured tiers, in read order.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Returns the most recently written value, or `V::default()`.
    pub async fn read(&self) -> Arc<V> {
        for (tier, stale) in self.tiers.iter().zip(self.stale.iter()) {
            if stale.load(Ordering::Acquire) {
                debug!(tier = tier.name(), "Cache tier stale, skipping");
                continue;
            }
            match self.load_from(tier.as_ref()).await {
                Ok(Some(value)) => {
                    debug!(tier = tier.name(), "Cache hit");
                    return value;
                }
                Ok(None) => debug!(tier = tier.name(), "Cache tier empty"),
                Err(e) => warn!(tier = tier.name(), error = %e, "Cache tier read failed, falling back"),
            }
        }
        Arc::new(V::default())
    }

    /// Replaces the value in every tier. Returns how many tiers accepted it.
    pub async fn write(&self, value: V) -> usize {
        let value = Arc::new(value);
        let mut written = 0;
        for (tier, stale) in self.tiers.iter().zip(self.stale.iter()) {
            match self.store_into(tier.as_ref(), value.clone()).await {
                Ok(()) => {
                    stale.store(false, Ordering::Release);
                    written += 1;
                }
                Err(e) => {
                    stale.store(true, Ordering::Release);
                    warn!(tier = tier.name(), error = %e, "Cache tier write failed, marked stale");
                }
            }
        }
        debug!(written, tiers = self.tiers.len(), "Cache written");
        written
    }

    async fn load_from(&self, tier: &dyn CacheTier<V>) -> Result<Option<Arc<V>>, FrameworkError> {
        tokio::time::timeout(self.tier_timeout, tier.load())
            .await
            .map_err(|_| FrameworkError::cache(tier.name(), "read timed out"))?
    }

    async fn store_into(&self, tier: &dyn CacheTier<V>, value: Arc<V>) -> Result<(), FrameworkError> {
        tokio::time::timeout(self.tier_timeout, tier.store(value))
            .await
            .map_err(|_| FrameworkError::cache(tier.name(), "write timed out"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FailingTier;
    use crate::tier::LocalTier;

    type Tier = Arc<dyn CacheTier<Vec<u32>>>;

    fn local() -> Tier {
        Arc::new(LocalTier::new())
    }

    fn failing() -> Tier {
        Arc::new(FailingTier::new())
    }

    #[tokio::test]
    async fn test_read_before_write_is_empty() {
        let cache = TieredCache::new(vec![local()], Duration::from_millis(50));
        assert!(cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_local_when_first_tier_fails() {
        let cache = TieredCache::new(vec![failing(), local()], Duration::from_millis(50));

        let written = cache.write(vec![4, 5]).await;
        assert_eq!(written, 1);
        assert_eq!(*cache.read().await, vec![4, 5]);
    }

    /// A tier that stores normally until told to reject writes; loads keep working.
    struct RejectingWrites {
        inner: LocalTier<Vec<u32>>,
        reject: AtomicBool,
    }

    #[async_trait::async_trait]
    impl CacheTier<Vec<u32>> for RejectingWrites {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn load(&self) -> Result<Option<Arc<Vec<u32>>>, FrameworkError> {
            self.inner.load().await
        }

        async fn store(&self, value: Arc<Vec<u32>>) -> Result<(), FrameworkError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(FrameworkError::cache("rejecting", "value too large"));
            }
            self.inner.store(value).await
        }
    }

    #[tokio::test]
    async fn test_tier_that_missed_a_write_does_not_shadow_newer_value() {
        let distributed = Arc::new(RejectingWrites {
            inner: LocalTier::new(),
            reject: AtomicBool::new(false),
        });
        let first: Tier = distributed.clone();
        let cache = TieredCache::new(vec![first, local()], Duration::from_millis(50));

        assert_eq!(cache.write(vec![1, 2]).await, 2);
        distributed.reject.store(true, Ordering::SeqCst);
        for _ in 0..3 {
            assert_eq!(cache.write(vec![3]).await, 1);
            assert_eq!(*cache.read().await, vec![3]);
        }

        // Once it accepts a write again, it is read first again.
        distributed.reject.store(false, Ordering::SeqCst);
        cache.write(vec![4]).await;
        distributed.inner.store(Arc::new(vec![5])).await.unwrap();
        assert_eq!(*cache.read().await, vec![5]);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_reads_default() {
        let cache = TieredCache::new(vec![failing(), failing()], Duration::from_millis(50));
        cache.write(vec![1]).await;
        assert!(cache.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tier_times_out_and_falls_back() {
        let hanging: Tier = Arc::new(FailingTier::hanging());
        let cache = TieredCache::new(vec![hanging, local()], Duration::from_millis(50));
        cache.write(vec![7]).await;
        assert_eq!(*cache.read().await, vec![7]);
    }

    #[tokio::test]
    async fn test_write_replaces_whole_value() {
        let cache = TieredCache::new(vec![local()], Duration::from_millis(50));
        cache.write(vec![1, 2, 3]).await;
        cache.write(vec![2]).await;
        assert_eq!(*cache.read().await, vec![2]);
    }
}
