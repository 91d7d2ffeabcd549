//! Error types for order operations.

use thiserror::Error;

/// Errors that can occur while reading or changing orders upstream.
///
/// Only these surface to HTTP callers. Cache, publish and sink failures are absorbed by
/// the framework (see `relay_framework::FrameworkError`).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The upstream service does not know the order.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The upstream service refused the transition.
    #[error("Upstream rejected the request: {0}")]
    UpstreamRejected(String),

    /// Network failure, timeout, or an unexpected upstream status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream answered with a body we could not decode.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Invalid item in order {order_id}: {reason}")]
    InvalidItem { order_id: u64, reason: String },
}

impl From<reqwest::Error> for OrderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            OrderError::MalformedResponse(e.to_string())
        } else {
            OrderError::UpstreamUnavailable(e.to_string())
        }
    }
}
