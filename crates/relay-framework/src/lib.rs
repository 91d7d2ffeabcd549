//! # Relay Framework
//!
//! Domain-agnostic building blocks for a small, failure-aware event pipeline:
//!
//! 1. **Read side**: a [`TieredCache`] kept fresh by a background [`Poller`], so readers
//!    never wait on the upstream system.
//! 2. **Write side**: a [`Publisher`] seam for emitting events after a confirmed state change.
//! 3. **Receive side**: a [`FanOutReceiver`] that records each inbound event in a bounded
//!    [`HistoryBuffer`] and forwards it to independent [`Sink`]s.
//!
//! ## Architecture Overview
//!
//! The framework follows the actor split used throughout:
//!
//! - **Logic layer** ([`FanOutReceiver`], [`TieredCache`]) - plain structs taking `&self`,
//!   usable from any runtime
//! - **Runtime layer** ([`FanOutActor`], [`Poller::run`]) - long-running tasks that own a
//!   channel or a timer and drive the logic sequentially
//! - **Interface layer** ([`FanOutClient`]) - cheap, cloneable handles for producers
//!
//! ## Single Writers
//!
//! Every piece of shared mutable state has exactly one writer role:
//!
//! | State | Writer | Readers |
//! |-------|--------|---------|
//! | [`TieredCache`] value | the [`Poller`] | any number of request handlers |
//! | [`HistoryBuffer`] | the [`FanOutReceiver`] | any number of listing handlers |
//!
//! Cache writes swap a whole value (`Arc<V>`) so readers see the old or the new value,
//! never a mix. History inserts and evictions happen under one write lock.
//!
//! ## Failure Policy
//!
//! See [`FrameworkError`] for which failures surface and which are absorbed.
//!
//! ## Testing
//!
//! The [`mock`] module provides scripted doubles for every trait in this crate.

pub mod cache;
pub mod error;
pub mod fanout;
pub mod history;
pub mod mock;
pub mod poller;
pub mod publisher;
pub mod sink;
pub mod tier;
pub mod tracing;

// Re-export core types for convenience
pub use cache::TieredCache;
pub use error::FrameworkError;
pub use fanout::{Diagnostics, FanOutActor, FanOutClient, FanOutReceiver, FanOutReport};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use poller::{PollGuard, PollOutcome, PollSource, Poller};
pub use publisher::Publisher;
pub use sink::Sink;
pub use tier::{CacheTier, LocalTier};
