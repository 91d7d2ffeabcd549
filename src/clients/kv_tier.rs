use crate::model::{entry_set, CacheEntrySet, OrderSnapshot};
use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use bytes::Bytes;
use relay_framework::{CacheTier, FrameworkError};
use std::sync::Arc;
use tracing::info;

const TIER_NAME: &str = "nats-kv";
const ACTIVE_ORDERS_KEY: &str = "active-orders";

/// Distributed cache tier backed by a NATS JetStream key-value bucket.
///
/// The whole entry set lives under one key, so a `store` is a single atomic put and
/// every kitchen instance reading the bucket sees the same complete set.
pub struct NatsKvTier {
    store: kv::Store,
}

impl NatsKvTier {
    /// Opens (or creates) `bucket` keeping only the latest revision.
    pub async fn connect(client: async_nats::Client, bucket: &str) -> Result<Self, FrameworkError> {
        let context = jetstream::new(client);
        let store = context
            .create_key_value(kv::Config {
                bucket: bucket.to_string(),
                history: 1,
                ..Default::default()
            })
            .await
            .map_err(|e| FrameworkError::cache(TIER_NAME, e))?;
        info!(bucket, "Distributed cache tier ready");
        Ok(Self { store })
    }
}

/// Entries are stored as a JSON array of snapshots.
pub fn encode_entries(entries: &CacheEntrySet) -> Result<Bytes, FrameworkError> {
    let snapshots: Vec<&OrderSnapshot> = entries.values().collect();
    serde_json::to_vec(&snapshots)
        .map(Bytes::from)
        .map_err(|e| FrameworkError::cache(TIER_NAME, e))
}

pub fn decode_entries(payload: &[u8]) -> Result<CacheEntrySet, FrameworkError> {
    serde_json::from_slice::<Vec<OrderSnapshot>>(payload)
        .map(entry_set)
        .map_err(|e| FrameworkError::cache(TIER_NAME, format!("deserialization: {}", e)))
}

#[async_trait]
impl CacheTier<CacheEntrySet> for NatsKvTier {
    fn name(&self) -> &'static str {
        TIER_NAME
    }

    async fn load(&self) -> Result<Option<Arc<CacheEntrySet>>, FrameworkError> {
        let payload = self
            .store
            .get(ACTIVE_ORDERS_KEY)
            .await
            .map_err(|e| FrameworkError::cache(TIER_NAME, e))?;
        payload
            .map(|bytes| decode_entries(&bytes).map(Arc::new))
            .transpose()
    }

    async fn store(&self, value: Arc<CacheEntrySet>) -> Result<(), FrameworkError> {
        let payload = encode_entries(&value)?;
        self.store
            .put(ACTIVE_ORDERS_KEY, payload)
            .await
            .map_err(|e| FrameworkError::cache(TIER_NAME, e))?;
        Ok(())
    }
}
