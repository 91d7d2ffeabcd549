//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for a relay process. Call it once from
//! `main`.
//!
//! - **Filtering** via `RUST_LOG` (`EnvFilter::from_default_env`)
//! - **Compact format** without module targets, so lines stay short
//!
//! ```bash
//! # Poll results, fan-out summaries, publish outcomes
//! RUST_LOG=info cargo run -- kitchen
//!
//! # Cache tier hits and fallbacks, full event payloads
//! RUST_LOG=debug cargo run -- waiter
//!
//! # Only the framework
//! RUST_LOG=relay_framework=debug cargo run -- kitchen
//! ```
//!
//! What gets logged where:
//!
//! | Event | Level |
//! |-------|-------|
//! | Poll succeeded / failed / skipped | `debug` / `warn` / `debug` |
//! | Cache tier fallback | `warn` |
//! | Event fanned out | `info` |
//! | Sink delivery failed | `warn` |
//! | Actor / poller start and shutdown | `info` |

/// Initializes the global tracing subscriber.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
