mod bot;
mod commands;
mod config;
mod platform;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::{self, TelegramResponder};
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,captionbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let addr = config.listen_addr()?;
    info!("Configuration loaded successfully");
    info!("  Listen address: {}", addr);
    info!("  Webhook path: {}", config.server.webhook_path);
    info!("  Bot API: {}", config.telegram.api_url);

    if let Some(webhook) = &config.webhook {
        telegram::register(&config.telegram, webhook).await;
    }

    let responder = TelegramResponder::new(&config.telegram)?;
    let state = Arc::new(AppState::new(Arc::new(responder)));
    let app = server::router(state, &config.server.webhook_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Bot is listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await
        .context("Server error")?;

    Ok(())
}
