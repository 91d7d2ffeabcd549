//! Pure data structures (DTOs) exchanged between the kitchen, the upstream order service,
//! the broker and the waiter side.

pub mod auth;
pub mod notification;
pub mod order;

pub use auth::*;
pub use notification::*;
pub use order::*;
