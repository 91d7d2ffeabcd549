//! HTTP surface of both roles.
//!
//! Every router gets request tracing and a permissive CORS policy; the kitchen display and
//! the waiter app are served from other origins.

pub mod demo;
pub mod error;
pub mod kitchen;
pub mod waiter;

pub use error::ApiError;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub(crate) fn with_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
