//! Adapters to the systems around the relay: the upstream order service, the broker, the
//! webhook target and the live-broadcast channel.

pub mod broadcast;
pub mod broker;
pub mod kv_tier;
pub mod upstream;
pub mod webhook;

pub use broadcast::*;
pub use broker::*;
pub use kv_tier::*;
pub use upstream::*;
pub use webhook::*;
