// Main entry point for the mock chat API

use anyhow::{Context, Result};
use mock_api::{serve, AppState, MockConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mock_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MockConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "Configuration loaded");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Mock API: {}", config.public_url);

    serve(listener, AppState::new(config))
        .await
        .context("Server error")?;

    Ok(())
}
