// HTTP server for the indexed browser automation engine.
//
// Reads config from $INDEXED_BROWSER_CONFIG or ./config.yaml, launches
// Chromium on startup and serves actions until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use indexed_browser::{AutomationEngine, load_yaml_config, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_yaml_config().context("Failed to load configuration")?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.server.host, config.server.port))?;

    let engine = Arc::new(AutomationEngine::from_config(&config));
    if let Err(e) = engine.initialize().await {
        // Sessions recover lazily, the next action retries the launch
        warn!("Browser failed to start: {}", e);
    }

    let served = start_server(addr, engine.clone(), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    })
    .await;

    if let Err(e) = engine.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
    served
}
