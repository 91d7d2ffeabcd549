//! Waiter side: broker consumption feeding the fan-out receiver.

pub mod consumer;
pub mod service;

pub use consumer::*;
pub use service::*;
