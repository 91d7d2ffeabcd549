//! # Order Relay
//!
//! One binary, two roles:
//!
//! - `order-relay kitchen` polls the order service into the kitchen cache and turns status
//!   changes into "order ready" notifications.
//! - `order-relay waiter` consumes those notifications and fans them out to the live
//!   stream and the webhook.
//!
//! Configuration comes from the environment (see [`Config`]); `--port` overrides `PORT`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use order_relay::config::Config;
use order_relay::lifecycle::{KitchenSystem, WaiterSystem};
use relay_framework::tracing::setup_tracing;
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "order-relay", version, about = "Kitchen and waiter relay for restaurant orders")]
struct Cli {
    #[command(subcommand)]
    role: Role,

    /// Port to listen on, overriding PORT
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Debug, Subcommand)]
enum Role {
    /// Serve the kitchen display API
    Kitchen,
    /// Consume ready notifications and serve the waiter API
    Waiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match cli.role {
        Role::Kitchen => {
            info!(%addr, upstream = %config.order_service_base_url, "Starting kitchen relay");
            let system = KitchenSystem::start(config).await?;
            serve(addr, system.router()).await?;
            system.shutdown().await
        }
        Role::Waiter => {
            info!(%addr, subject = %config.order_ready_subject, "Starting waiter relay");
            let system = WaiterSystem::start(config).await?;
            serve(addr, system.router()).await?;
            system.shutdown().await
        }
    }
}

async fn serve(addr: SocketAddr, router: axum::Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received");
        })
        .await
        .context("server error")
}
