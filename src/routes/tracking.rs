// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking session routes.

use crate::error::Result;
use crate::models::{SensorEvent, TotalsSnapshot};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking/start", post(start_tracking))
        .route("/api/tracking/stop", post(stop_tracking))
        .route("/api/tracking/events", post(post_events))
}

async fn start_tracking(State(state): State<Arc<AppState>>) -> Result<Json<TotalsSnapshot>> {
    Ok(Json(state.tracker.start().await?))
}

/// Stop tracking. Stopping an idle tracker returns the current snapshot.
async fn stop_tracking(State(state): State<Arc<AppState>>) -> Result<Json<TotalsSnapshot>> {
    let snapshot = state.tracker.stop().await?;
    Ok(Json(snapshot.unwrap_or_else(|| state.session.snapshot())))
}

/// Apply a batch of sensor events in order. An empty batch is fine.
async fn post_events(
    State(state): State<Arc<AppState>>,
    Json(events): Json<Vec<SensorEvent>>,
) -> Result<Json<TotalsSnapshot>> {
    tracing::trace!(count = events.len(), "Sensor batch received");
    Ok(Json(state.tracker.feed(events).await?))
}
