use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub order_service_base_url: String,
    pub upstream_timeout: Duration,
    pub poll_interval: Duration,
    pub nats_url: String,
    pub order_ready_subject: String,
    pub waiter_group: String,
    pub cache_distributed_enabled: bool,
    pub cache_bucket: String,
    pub cache_read_timeout: Duration,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
    pub broadcast_channel: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order_service_base_url: "http://localhost:8081/api".to_string(),
            upstream_timeout: Duration::from_millis(3000),
            poll_interval: Duration::from_millis(5000),
            nats_url: "nats://localhost:4222".to_string(),
            order_ready_subject: "order-ready".to_string(),
            waiter_group: "waiter-group-v2".to_string(),
            cache_distributed_enabled: false,
            cache_bucket: "kitchen-cache".to_string(),
            cache_read_timeout: Duration::from_millis(250),
            webhook_url: None,
            webhook_timeout: Duration::from_millis(5000),
            broadcast_channel: "/topic/orders".to_string(),
            port: 8085,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable lookup. Unset variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let string = |name: &str, default: String| lookup(name).unwrap_or(default);

        Ok(Self {
            order_service_base_url: string("ORDER_SERVICE_BASE_URL", defaults.order_service_base_url),
            upstream_timeout: millis(&lookup, "UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout)?,
            poll_interval: millis(&lookup, "POLL_INTERVAL_MS", defaults.poll_interval)?,
            nats_url: string("NATS_URL", defaults.nats_url),
            order_ready_subject: string("ORDER_READY_SUBJECT", defaults.order_ready_subject),
            waiter_group: string("WAITER_GROUP", defaults.waiter_group),
            cache_distributed_enabled: parsed(
                &lookup,
                "CACHE_DISTRIBUTED_ENABLED",
                defaults.cache_distributed_enabled,
            )?,
            cache_bucket: string("CACHE_BUCKET", defaults.cache_bucket),
            cache_read_timeout: millis(&lookup, "CACHE_READ_TIMEOUT_MS", defaults.cache_read_timeout)?,
            webhook_url: lookup("WEBHOOK_URL").filter(|url| !url.trim().is_empty()),
            webhook_timeout: millis(&lookup, "WEBHOOK_TIMEOUT_MS", defaults.webhook_timeout)?,
            broadcast_channel: string("BROADCAST_CHANNEL", defaults.broadcast_channel),
            port: parsed(&lookup, "PORT", defaults.port)?,
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", name, value)),
        None => Ok(default),
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Result<Duration> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    let ms: u64 = parsed(lookup, name, default_ms)?;
    anyhow::ensure!(ms > 0, "{} must be positive", name);
    Ok(Duration::from_millis(ms))
}
