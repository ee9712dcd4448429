// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stepps tracker API server.

use stepps_tracker::{config::Config, db::Database, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        threshold = config.tracker.detector.threshold,
        cooldown_ms = config.tracker.detector.cooldown_ms,
        checkpoint_every = config.tracker.checkpoint_every_steps,
        "Starting Stepps tracker"
    );

    let db = Database::connect(&config).await?;
    tracing::info!(store = db.backend_name(), "Store ready");

    let state = Arc::new(AppState::new(config.clone(), db));
    let app = stepps_tracker::routes::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush a running session before exit.
    if let Err(e) = state.tracker.stop().await {
        tracing::warn!(error = %e, "Final flush failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stepps_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
