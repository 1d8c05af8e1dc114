mod config;
mod dispatch;
mod outbound;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,duesbot=debug".into()),
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

    info!("Configuration loaded successfully");
    info!("  Item: {}", config.payment.item);
    info!(
        "  Currency: {} (minimum amount {})",
        config.payment.currency, config.payment.min_amount
    );
    info!("  Listen: {}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState::new(config));

    // Tell Telegram where to POST updates. Skipped when no URL is
    // configured, e.g. when the webhook is already registered.
    if state.config.telegram.webhook_url.is_empty() {
        info!("No webhook_url configured, skipping setWebhook");
    } else {
        outbound::register_webhook(&state.bot, &state.config.telegram.webhook_url).await?;
    }

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Server started on {}", addr);
    axum::serve(listener, webhook::router(state))
        .await
        .context("Server error")?;

    Ok(())
}
