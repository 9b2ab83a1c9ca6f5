use anyhow::Context;
use tracing::info;

use career_radar::api::{build_router, AppState};
use career_radar::logging::init_tracing;
use career_radar::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to initialise logging")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        "Starting career-radar v{} with {} configured feeds",
        env!("CARGO_PKG_VERSION"),
        config.feeds.urls.len()
    );

    let state = AppState::from_config(config).context("failed to build application state")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
