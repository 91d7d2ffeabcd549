//! # Cache Tiers
//!
//! A [`CacheTier`] is one storage level of a [`TieredCache`](crate::TieredCache).
//! Tiers hold a single whole value (for example a full map of entries) rather than
//! individual keys, so a `store` is always a wholesale replacement.
//!
//! The framework ships the in-process [`LocalTier`]. Distributed tiers live in the
//! application crate, next to the client they wrap.

use crate::error::FrameworkError;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// One storage level of a tiered cache.
///
/// Implementations must treat `store` as an atomic swap: a concurrent `load` sees either
/// the previous value or the new one.
#[async_trait]
pub trait CacheTier<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    /// Short name used in logs (e.g. `"local"`, `"nats-kv"`).
    fn name(&self) -> &'static str;

    /// Returns the last stored value, or `None` if nothing was stored yet.
    async fn load(&self) -> Result<Option<Arc<V>>, FrameworkError>;

    /// Replaces the stored value.
    async fn store(&self, value: Arc<V>) -> Result<(), FrameworkError>;
}

/// In-process tier holding the value behind an `Arc`.
///
/// The lock only guards a pointer swap, so readers never wait on I/O.
pub struct LocalTier<V> {
    slot: RwLock<Option<Arc<V>>>,
}

impl<V> LocalTier<V> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<V> Default for LocalTier<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> CacheTier<V> for LocalTier<V>
where
    V: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<Option<Arc<V>>, FrameworkError> {
        Ok(self.slot.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn store(&self, value: Arc<V>) -> Result<(), FrameworkError> {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_tier_starts_empty() {
        let tier = LocalTier::<Vec<u32>>::new();
        assert!(tier.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_tier_replaces_value() {
        let tier = LocalTier::new();
        tier.store(Arc::new(vec![1, 2, 3])).await.unwrap();
        tier.store(Arc::new(vec![9])).await.unwrap();

        let value = tier.load().await.unwrap().unwrap();
        assert_eq!(*value, vec![9]);
    }
}
