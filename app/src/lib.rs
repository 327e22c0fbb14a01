//! wbtc.cafe service entry point
//!
//! Loads configuration, serves the HTTP API and runs the destination
//! transaction watcher until interrupted.

pub mod dest_watcher;

use anyhow::Context;
use cafe_api::{start_server, AppState};
use cafe_core::AppConfig;

use crate::dest_watcher::DestWatcher;

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,wbtc_cafe=debug,renbridge=debug")),
        )
        .init();

    tracing::info!("Starting wbtc.cafe");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(serve())
}

async fn serve() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    let state = AppState::new(config).context("initializing services")?;

    let watcher = DestWatcher::new(state.clone()).spawn();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
        }
        tracing::info!("Shutting down");
    };
    let served = start_server(state, shutdown).await;

    watcher.abort();
    served.context("API server failed")
}
