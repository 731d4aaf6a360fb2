use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use jukir_backend::config::AppConfig;
use jukir_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Subscriber goes in first so config loading is logged; the file's
    // filter replaces the default afterwards unless RUST_LOG is set
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config = AppConfig::load()?;
    if !from_env {
        filter_handle
            .reload(EnvFilter::new(&config.log_filter))
            .context("failed to apply log_filter")?;
    }

    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config.cors_origin)?;

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Starting server on {}", config.bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
