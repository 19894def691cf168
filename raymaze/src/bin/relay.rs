//! Raymaze Relay
//!
//! Broadcast hub for raymaze clients. Bind address comes from
//! `RAYMAZE_BIND_ADDR` (default `0.0.0.0:8765`).

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use raymaze::{
    network::{RelayConfig, RelayServer},
    VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Raymaze relay v{}", VERSION);
    let server = RelayServer::new(RelayConfig::from_env());

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    Ok(())
}
