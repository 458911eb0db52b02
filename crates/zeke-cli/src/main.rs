//! zeke-bridge entry point: the composition root.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use zeke_cli::{Cli, logging};
use zeke_http::ResilientClient;
use zeke_proxy::{AppState, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let config = cli.into_config();
    config.validate().context("invalid configuration")?;
    info!(
        port = config.port,
        search_url = %config.search_url,
        reader_url = %config.reader_url,
        chat_url = %config.chat_url,
        max_attempts = config.retry.max_attempts(),
        "starting zeke-bridge"
    );

    let client = ResilientClient::with_reqwest(config.retry).context("failed to build HTTP client")?;
    let shutdown = CancellationToken::new();
    let state = AppState::new(&config, Arc::new(client));

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "could not listen for Ctrl-C"),
        }
    });

    serve(listener, state, shutdown).await.context("server failed")?;
    Ok(())
}
