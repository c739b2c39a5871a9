//! Main Entrypoint for the Parley Relay Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Constructing the Axum router and applying the CORS boundary.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use axum::http::HeaderValue;
use parley_relay::{config::Config, router::create_router, state::AppState};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    if config.xai_api_key.is_none() {
        // Sessions will be rejected with an error frame until the key is set.
        tracing::warn!("XAI_API_KEY is not set");
    }

    let origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .context("CORS_ALLOWED_ORIGIN is not a valid header value")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_state = Arc::new(AppState::new(config.clone()));
    let app = create_router(app_state).layer(cors);

    info!(
        bind_address = %config.bind_address,
        upstream_url = %config.upstream_url,
        "Relay configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
