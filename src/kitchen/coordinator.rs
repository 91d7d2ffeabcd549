//! # Status Coordinator
//!
//! Performs a status change against the upstream order service and, only once the upstream
//! has confirmed it, announces READY orders to the waiter side.
//!
//! ## Ordering
//!
//! 1. Upstream update with the caller's credentials forwarded verbatim.
//! 2. Upstream failure returns immediately. Nothing is built or published.
//! 3. Upstream success with a READY target publishes one [`NotificationEvent`] built from
//!    the confirmed snapshot. A publish failure is logged and swallowed: the status change
//!    already happened upstream and is not rolled back.
//! 4. The confirmed snapshot is returned.
//!
//! Every non-READY target takes the same path without a publish. Repeating a transition the
//! order already went through is left to the upstream's own idempotency.

use crate::clients::OrderUpstream;
use crate::error::OrderError;
use crate::model::{AuthContext, NotificationEvent, OrderId, OrderSnapshot, OrderStatus};
use relay_framework::Publisher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct StatusCoordinator {
    upstream: Arc<dyn OrderUpstream>,
    publisher: Arc<dyn Publisher<NotificationEvent>>,
    timeout: Duration,
}

impl StatusCoordinator {
    /// `timeout` bounds the upstream update call.
    pub fn new(
        upstream: Arc<dyn OrderUpstream>,
        publisher: Arc<dyn Publisher<NotificationEvent>>,
        timeout: Duration,
    ) -> Self {
        Self {
            upstream,
            publisher,
            timeout,
        }
    }

    #[instrument(skip_all, fields(order_id = %order_id, target = %target))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        auth: &AuthContext,
    ) -> Result<OrderSnapshot, OrderError> {
        let snapshot = tokio::time::timeout(self.timeout, self.upstream.update_status(order_id, target, auth))
            .await
            .map_err(|_| {
                OrderError::UpstreamUnavailable(format!(
                    "status update timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .inspect_err(|e| warn!(error = %e, "Upstream refused status change"))?;

        if target == OrderStatus::Ready {
            let event = NotificationEvent::from_snapshot(&snapshot);
            match self.publisher.publish(&event).await {
                Ok(()) => info!(table_id = %event.table_id, "Ready notification published"),
                Err(e) => error!(error = %e, "Ready notification lost, status change stands"),
            }
        }

        info!(status = %snapshot.status, "Status change confirmed");
        Ok(snapshot)
    }
}
