//! # Order Relay
//!
//! The restaurant side of the relay pipeline, built on [`relay_framework`].
//!
//! ## Data Flow
//!
//! ```text
//! order service ──poll──▶ TieredCache ──read──▶ GET /api/kitchen/orders
//!
//! POST /api/kitchen/orders/{id}/ready
//!   └─▶ StatusCoordinator ──update──▶ order service
//!         └─[confirmed]─▶ NatsPublisher ──▶ broker
//!                                              │
//!                 OrderReadyConsumer ◀─────────┘
//!                   └─▶ FanOutActor ─▶ history, broadcast (/api/waiter/stream), webhook
//! ```
//!
//! ## Module Tour
//!
//! - [`model`]: orders, notifications and forwarded credentials
//! - [`clients`]: adapters for the order service, NATS, the webhook and the live broadcast
//! - [`kitchen`]: the poll source, the [`StatusCoordinator`](kitchen::StatusCoordinator) and
//!   the read service behind the kitchen API
//! - [`waiter`]: broker consumption and the read service behind the waiter API
//! - [`api`]: axum routers for both roles
//! - [`lifecycle`]: [`KitchenSystem`](lifecycle::KitchenSystem) and
//!   [`WaiterSystem`](lifecycle::WaiterSystem), which start, wire and stop everything
//! - [`mock`]: a scripted order service for tests
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run -- kitchen
//! RUST_LOG=info cargo run -- waiter --port 8086
//! ```

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod kitchen;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod waiter;

pub use error::OrderError;
