//! Relay Server - HTTP backend for relay path and backbone planning

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_server::api;
use relay_server::config::Config;
use relay_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Relay Server...");

    let state = Arc::new(AppState::from_config(&config)?);
    tracing::info!(
        towers = state.towers().len(),
        link_range_km = config.planner.link_range_km,
        "planner ready"
    );

    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
