//! # Framework Errors
//!
//! This module defines the error types shared by every pipeline stage. Each variant
//! corresponds to a failure class with its own propagation rule:
//!
//! | Variant | Surfaces to caller? |
//! |---------|---------------------|
//! | [`FrameworkError::CacheUnavailable`] | Never, recovered by tier fallback |
//! | [`FrameworkError::PublishFailed`] | Never, logged by the publishing side |
//! | [`FrameworkError::SinkDeliveryFailed`] | Never, recorded in diagnostics |
//! | [`FrameworkError::ReceiverClosed`] / [`FrameworkError::ReceiverDropped`] | To the consumption runtime |

/// Errors that can occur within the relay framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Cache tier '{tier}' unavailable: {reason}")]
    CacheUnavailable { tier: &'static str, reason: String },
    #[error("Publish failed: {0}")]
    PublishFailed(String),
    #[error("Sink '{sink}' delivery failed: {reason}")]
    SinkDeliveryFailed { sink: String, reason: String },
    #[error("Receiver closed")]
    ReceiverClosed,
    #[error("Receiver dropped response channel")]
    ReceiverDropped,
}

impl FrameworkError {
    /// Shorthand for a tier failure.
    pub fn cache(tier: &'static str, reason: impl ToString) -> Self {
        FrameworkError::CacheUnavailable {
            tier,
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a sink failure.
    pub fn sink(sink: impl Into<String>, reason: impl ToString) -> Self {
        FrameworkError::SinkDeliveryFailed {
            sink: sink.into(),
            reason: reason.to_string(),
        }
    }
}
