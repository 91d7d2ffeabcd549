//! Outbound event publishing.

use crate::error::FrameworkError;
use async_trait::async_trait;

/// Transport-agnostic emitter of events to a broker.
///
/// Implementations report the outcome synchronously and own no retry policy; retries, if
/// any, belong to the underlying broker client. Failures are returned as
/// [`FrameworkError::PublishFailed`].
#[async_trait]
pub trait Publisher<E>: Send + Sync
where
    E: Send + Sync,
{
    async fn publish(&self, event: &E) -> Result<(), FrameworkError>;
}
