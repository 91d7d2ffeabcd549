//! Orchestrators that start, wire and stop each role.

pub mod kitchen_system;
pub mod waiter_system;

pub use kitchen_system::KitchenSystem;
pub use waiter_system::WaiterSystem;

use anyhow::{Context, Result};
use tracing::info;

/// Connects to the broker without failing when it is not up yet; the client keeps
/// reconnecting in the background.
pub async fn connect_broker(url: &str) -> Result<async_nats::Client> {
    let client = async_nats::ConnectOptions::new()
        .retry_on_initial_connect()
        .connect(url)
        .await
        .with_context(|| format!("invalid broker address {}", url))?;
    info!(url, "Broker client created");
    Ok(client)
}
