//! Kitchen side: the cached view of active orders and the status coordinator.

pub mod coordinator;
pub mod service;
pub mod source;

pub use coordinator::*;
pub use service::*;
pub use source::*;
