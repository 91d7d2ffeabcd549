//! # Background Poller
//!
//! The [`Poller`] keeps a [`TieredCache`] fresh by periodically pulling a complete value
//! from a [`PollSource`]. It is the cache's only writer.
//!
//! ## Rules
//!
//! 1. Every fetch is bounded by the poll timeout.
//! 2. A failed or timed-out fetch leaves the cache untouched.
//!    A fetch that no tier accepted is reported as failed too.
//! 3. Polls never overlap. A tick that fires while a poll is in flight is skipped, not
//!    queued. The [`PollGuard`] enforces this for manual triggers too
//!    (see [`Poller::poll_once`]).
//!
//! ## Shutdown
//!
//! [`Poller::run`] exits when the `watch` sender it was given flips to `true` or is dropped.

use crate::cache::TieredCache;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Something that can produce a complete, fresh value for the cache.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// The whole value written to the cache on success.
    type Output: Default + Send + Sync + 'static;

    /// The error returned when a fetch fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the current upstream state.
    async fn fetch(&self) -> Result<Self::Output, Self::Error>;
}

/// Result of a single poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The cache now holds the fetched value.
    Refreshed,
    /// The fetch failed; the cache was not touched.
    Failed(String),
    /// Another poll was already in flight.
    Skipped,
}

/// Reentrancy guard shared by every handle of one poller.
#[derive(Clone, Default)]
pub struct PollGuard {
    in_flight: Arc<AtomicBool>,
}

impl PollGuard {
    /// Claims the guard, or returns `None` if a poll is already running.
    pub fn try_acquire(&self) -> Option<PollPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollPermit {
                in_flight: self.in_flight.clone(),
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the [`PollGuard`] when dropped.
pub struct PollPermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for PollPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Periodic refresher for a [`TieredCache`].
///
/// Cloning is cheap; clones share the source, the cache and the guard, so a clone can be
/// kept around to trigger manual refreshes while the original runs the timer loop.
pub struct Poller<S: PollSource> {
    source: Arc<S>,
    cache: TieredCache<S::Output>,
    interval: Duration,
    timeout: Duration,
    guard: PollGuard,
}

impl<S: PollSource> Clone for Poller<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cache: self.cache.clone(),
            interval: self.interval,
            timeout: self.timeout,
            guard: self.guard.clone(),
        }
    }
}

impl<S: PollSource> Poller<S> {
    /// Creates a poller.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between ticks. Independent of request traffic.
    /// * `timeout` - Upper bound for one fetch.
    pub fn new(source: Arc<S>, cache: TieredCache<S::Output>, interval: Duration, timeout: Duration) -> Self {
        Self {
            source,
            cache,
            interval,
            timeout,
            guard: PollGuard::default(),
        }
    }

    pub fn guard(&self) -> &PollGuard {
        &self.guard
    }

    /// Runs one poll unless another one is in flight.
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!("Poll already in flight, skipping tick");
            return PollOutcome::Skipped;
        };

        match tokio::time::timeout(self.timeout, self.source.fetch()).await {
            Ok(Ok(value)) => {
                if self.cache.write(value).await == 0 {
                    warn!("Poll succeeded but no cache tier accepted the value");
                    return PollOutcome::Failed("no tier accepted the write".to_string());
                }
                debug!("Poll succeeded, cache refreshed");
                PollOutcome::Refreshed
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Poll failed, keeping previous cache");
                PollOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Poll timed out, keeping previous cache");
                PollOutcome::Failed("timed out".to_string())
            }
        }
    }

    /// Runs the timer loop until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires immediately so the cache is warm right after startup.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.interval.as_millis() as u64, "Poller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Poller shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailingTier, MockSource};
    use crate::tier::{CacheTier, LocalTier};

    fn cache() -> TieredCache<Vec<u32>> {
        let local: Arc<dyn CacheTier<Vec<u32>>> = Arc::new(LocalTier::new());
        TieredCache::new(vec![local], Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_cache() {
        let mut source = MockSource::new();
        source.expect_fetch().return_ok(vec![1, 2]);
        source.expect_fetch().return_err("upstream returned 500");
        let source = Arc::new(source);

        let cache = cache();
        let poller = Poller::new(source.clone(), cache.clone(), Duration::from_secs(5), Duration::from_secs(1));

        assert_eq!(poller.poll_once().await, PollOutcome::Refreshed);
        assert!(matches!(poller.poll_once().await, PollOutcome::Failed(_)));
        assert_eq!(*cache.read().await, vec![1, 2]);
        source.verify();
    }

    #[tokio::test]
    async fn test_poll_with_no_writable_tier_fails() {
        let mut source = MockSource::new();
        source.expect_fetch().return_ok(vec![1]);
        let source = Arc::new(source);

        let down: Arc<dyn CacheTier<Vec<u32>>> = Arc::new(FailingTier::new());
        let cache = TieredCache::new(vec![down], Duration::from_millis(50));
        let poller = Poller::new(source.clone(), cache, Duration::from_secs(5), Duration::from_secs(1));

        assert_eq!(
            poller.poll_once().await,
            PollOutcome::Failed("no tier accepted the write".to_string())
        );
        assert_eq!(source.fetches(), 1);
        source.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_poll_keeps_cache() {
        let mut source = MockSource::new();
        source.expect_fetch().return_ok(vec![3]);
        source
            .expect_fetch()
            .delay(Duration::from_secs(10))
            .return_ok(vec![4]);
        let source = Arc::new(source);

        let cache = cache();
        let poller = Poller::new(source, cache.clone(), Duration::from_secs(5), Duration::from_secs(1));

        poller.poll_once().await;
        assert_eq!(poller.poll_once().await, PollOutcome::Failed("timed out".to_string()));
        assert_eq!(*cache.read().await, vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_poll_is_skipped() {
        let mut source = MockSource::new();
        source
            .expect_fetch()
            .delay(Duration::from_millis(500))
            .return_ok(vec![1]);
        let source = Arc::new(source);

        let poller = Poller::new(source.clone(), cache(), Duration::from_secs(5), Duration::from_secs(1));
        let other = poller.clone();

        let (first, second) = tokio::join!(poller.poll_once(), other.poll_once());
        assert_eq!(first, PollOutcome::Refreshed);
        assert_eq!(second, PollOutcome::Skipped);
        assert!(!poller.guard().is_in_flight());
        source.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let mut source = MockSource::new();
        source.expect_fetch().return_ok(vec![8]);
        let source = Arc::new(source);

        let cache = cache();
        let poller = Poller::new(source.clone(), cache.clone(), Duration::from_secs(60), Duration::from_secs(1));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(poller.run(rx));

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*cache.read().await, vec![8]);

        tx.send(true).unwrap();
        handle.await.unwrap();
        source.verify();
    }
}
