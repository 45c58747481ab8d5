mod bot;
mod config;
mod templates;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,doorman=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config =
        Config::from_env().context("Failed to load configuration from the environment")?;

    info!("Configuration loaded");
    info!("  Channel: {}", config.channel_id);
    info!(
        "  Webhook: {}{}",
        config.external_url.trim_end_matches('/'),
        config.webhook_path
    );
    info!("  Port: {}", config.port);

    let state = Arc::new(AppState::new(config));

    info!("Bot is starting...");
    bot::run(state).await?;

    Ok(())
}
