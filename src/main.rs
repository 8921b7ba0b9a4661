use crate::booter::Booter;
use crate::config::AppConfig;
use crate::core::converter::MarkItDownCli;
use crate::core::staging::{prepare_upload_dir, sweep_stale};
use crate::server::types::AppState;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub mod booter;
pub mod config;
pub mod core;
pub mod error;
pub mod pages;
pub mod server;
pub mod utils;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = AppConfig::from_env()?;

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();
    tracing::info!(profile = config.profile.as_str(), config = ?config, "configuration loaded");

    prepare_upload_dir(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;
    let swept = sweep_stale(&config.upload_dir).await?;
    if swept > 0 {
        tracing::warn!(swept, "removed staged files left by a previous run");
    }

    let converter = Arc::new(MarkItDownCli::new(config.markitdown_bin.clone()));
    let state = Arc::new(AppState::new(config, converter)?);
    let router = server::router(Arc::clone(&state));

    let booter = Booter::new(&state.config).await?;
    tracing::info!("Listening on {}", booter.addr);
    booter.start(router).await?;

    state.dispatcher.shutdown().await;
    Ok(())
}
