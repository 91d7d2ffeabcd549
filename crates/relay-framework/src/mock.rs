//! # Mock Framework & Testing Guide
//!
//! Test doubles for every seam of the pipeline, so each stage can be tested without a
//! network, a broker or a real upstream.
//!
//! | Double | Stands in for | Typical use |
//! |--------|---------------|-------------|
//! | [`MockSource`] | [`PollSource`] | Script poll results with `expect_fetch()` |
//! | [`MockSink`] | [`Sink`] | Record deliveries, or fail / panic on every call |
//! | [`MockPublisher`] | [`Publisher`] | Record published events, or fail on every call |
//! | [`FailingTier`] | [`CacheTier`] | Simulate a distributed tier that is down or hanging |
//!
//! ## Scripting a source
//!
//! ```rust
//! use relay_framework::mock::MockSource;
//! use relay_framework::PollSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut source = MockSource::<Vec<u32>>::new();
//!     source.expect_fetch().return_ok(vec![1, 2]);
//!     source.expect_fetch().return_err("connection refused");
//!
//!     assert_eq!(source.fetch().await.unwrap(), vec![1, 2]);
//!     assert!(source.fetch().await.is_err());
//!
//!     source.verify(); // Ensures all expectations were met
//! }
//! ```
//!
//! ## Simulating failures
//!
//! ```rust
//! use relay_framework::mock::MockSink;
//! use relay_framework::{FanOutReceiver, Sink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let broadcast = Arc::new(MockSink::recording("broadcast"));
//!     let webhook = Arc::new(MockSink::failing("webhook"));
//!     let sinks: Vec<Arc<dyn Sink<&str>>> = vec![broadcast.clone(), webhook.clone()];
//!     let receiver = FanOutReceiver::new(50, sinks);
//!
//!     receiver.on_event("order 7 ready").await;
//!
//!     assert_eq!(broadcast.received(), vec!["order 7 ready"]);
//!     assert_eq!(webhook.attempts(), 1);
//! }
//! ```

use crate::error::FrameworkError;
use crate::poller::PollSource;
use crate::publisher::Publisher;
use crate::sink::Sink;
use crate::tier::CacheTier;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// POLL SOURCE
// =============================================================================

/// Error returned by scripted failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);

struct FetchExpectation<V> {
    response: Result<V, MockError>,
    delay: Option<Duration>,
}

/// A [`PollSource`] that replays scripted responses in order.
///
/// A fetch with no expectation left panics, like an unexpected request would.
pub struct MockSource<V> {
    expectations: Arc<Mutex<VecDeque<FetchExpectation<V>>>>,
    fetches: AtomicUsize,
}

impl<V> MockSource<V> {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Expects one `fetch` call.
    pub fn expect_fetch(&mut self) -> FetchExpectationBuilder<V> {
        FetchExpectationBuilder {
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Number of fetches performed so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        assert_eq!(remaining, 0, "{} expected fetch(es) never happened", remaining);
    }
}

impl<V> Default for MockSource<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned by [`MockSource::expect_fetch`].
pub struct FetchExpectationBuilder<V> {
    delay: Option<Duration>,
    expectations: Arc<Mutex<VecDeque<FetchExpectation<V>>>>,
}

impl<V> FetchExpectationBuilder<V> {
    /// Makes the fetch take `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn return_ok(self, value: V) {
        self.push(Ok(value));
    }

    pub fn return_err(self, message: impl Into<String>) {
        self.push(Err(MockError(message.into())));
    }

    fn push(self, response: Result<V, MockError>) {
        self.expectations.lock().unwrap().push_back(FetchExpectation {
            response,
            delay: self.delay,
        });
    }
}

#[async_trait]
impl<V> PollSource for MockSource<V>
where
    V: Default + Send + Sync + 'static,
{
    type Output = V;
    type Error = MockError;

    async fn fetch(&self) -> Result<V, MockError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let expectation = self.expectations.lock().unwrap().pop_front();
        let Some(expectation) = expectation else {
            panic!("Unexpected fetch: no expectation set");
        };
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        expectation.response
    }
}

// =============================================================================
// SINK
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Behaviour {
    Record,
    Fail,
    Panic,
}

/// A [`Sink`] that records what it receives.
pub struct MockSink<E> {
    name: String,
    behaviour: Behaviour,
    received: Mutex<Vec<E>>,
    attempts: AtomicUsize,
}

impl<E> MockSink<E> {
    fn with(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            received: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Accepts and records every event.
    pub fn recording(name: &str) -> Self {
        Self::with(name, Behaviour::Record)
    }

    /// Fails every delivery.
    pub fn failing(name: &str) -> Self {
        Self::with(name, Behaviour::Fail)
    }

    /// Panics on every delivery.
    pub fn panicking(name: &str) -> Self {
        Self::with(name, Behaviour::Panic)
    }

    /// Number of delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<E: Clone> MockSink<E> {
    /// Events accepted so far, in delivery order.
    pub fn received(&self) -> Vec<E> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl<E> Sink<E> for MockSink<E>
where
    E: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, event: &E) -> Result<(), FrameworkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Record => {
                self.received.lock().unwrap().push(event.clone());
                Ok(())
            }
            Behaviour::Fail => Err(FrameworkError::sink(&self.name, "scripted failure")),
            Behaviour::Panic => panic!("sink '{}' panicked", self.name),
        }
    }
}

// =============================================================================
// PUBLISHER
// =============================================================================

/// A [`Publisher`] that records published events.
pub struct MockPublisher<E> {
    fail: bool,
    published: Mutex<Vec<E>>,
    attempts: AtomicUsize,
}

impl<E> MockPublisher<E> {
    pub fn recording() -> Self {
        Self {
            fail: false,
            published: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Fails every publish, as if the broker were unreachable.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::recording()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<E: Clone> MockPublisher<E> {
    pub fn published(&self) -> Vec<E> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl<E> Publisher<E> for MockPublisher<E>
where
    E: Clone + Send + Sync,
{
    async fn publish(&self, event: &E) -> Result<(), FrameworkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FrameworkError::PublishFailed("broker unreachable".to_string()));
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// =============================================================================
// CACHE TIER
// =============================================================================

/// A [`CacheTier`] that is always down.
pub struct FailingTier {
    hang: bool,
}

impl FailingTier {
    /// Fails immediately on every access.
    pub fn new() -> Self {
        Self { hang: false }
    }

    /// Never answers, so only a timeout gets the caller out.
    pub fn hanging() -> Self {
        Self { hang: true }
    }
}

impl Default for FailingTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> CacheTier<V> for FailingTier
where
    V: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn load(&self) -> Result<Option<Arc<V>>, FrameworkError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(FrameworkError::cache("failing", "connection refused"))
    }

    async fn store(&self, _value: Arc<V>) -> Result<(), FrameworkError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(FrameworkError::cache("failing", "connection refused"))
    }
}
