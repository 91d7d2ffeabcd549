//! # Sinks
//!
//! A [`Sink`] is a best-effort downstream destination for received events, such as a
//! live-broadcast channel or a webhook. The [`FanOutReceiver`](crate::FanOutReceiver)
//! calls every sink independently and only records failures.

use crate::error::FrameworkError;
use async_trait::async_trait;

/// A best-effort downstream destination for events of type `E`.
#[async_trait]
pub trait Sink<E>: Send + Sync
where
    E: Send + Sync,
{
    /// Short name used in logs and diagnostics (e.g. `"broadcast"`, `"webhook"`).
    fn name(&self) -> &str;

    /// Delivers one event. Retrying, if any, is the sink's own business.
    async fn deliver(&self, event: &E) -> Result<(), FrameworkError>;
}
