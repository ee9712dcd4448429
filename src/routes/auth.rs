// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::user::ProfileResponse;
use crate::services::profile::{LoginRequest, RegisterRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/guest", post(guest))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need a signed-in user (gated in routes/mod.rs).
pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/account", delete(delete_account))
}

/// Session state after signing in.
#[derive(Serialize)]
pub struct SessionResponse {
    pub guest: bool,
    pub profile: Option<ProfileResponse>,
    pub current_streak: u32,
}

/// Create an account. Does not sign in.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    let profile = state.profiles.register(request).await?;
    Ok((StatusCode::CREATED, Json(ProfileResponse::from(&profile))))
}

/// Sign in. Any running session is flushed under the previous identity first.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let profile = state.profiles.login(request).await?;

    state.tracker.stop().await?;
    state.session.sign_in(&profile);
    state.tracker.refresh_progress(profile.user_id).await;

    tracing::info!(user_id = profile.user_id, "User signed in");
    Ok(Json(SessionResponse {
        guest: false,
        profile: Some(ProfileResponse::from(&profile)),
        current_streak: state.session.current_streak(),
    }))
}

/// Track without an account.
async fn guest(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>> {
    state.tracker.stop().await?;
    state.session.sign_in_guest();

    tracing::info!("Guest session started");
    Ok(Json(SessionResponse {
        guest: true,
        profile: None,
        current_streak: 0,
    }))
}

/// Sign out, flushing an active tracking session.
async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    let user_id = state.session.user_id();
    state.tracker.stop().await?;
    state.session.sign_out();

    tracing::info!(user_id = ?user_id, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub deleted_documents: usize,
}

/// Delete the signed-in account and everything it owns.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DeleteAccountResponse>> {
    // Stop first so a final flush cannot recreate today's record.
    state.tracker.stop().await?;
    state.session.sign_out();

    let deleted_documents = state.profiles.delete_account(user.user_id).await?;
    Ok(Json(DeleteAccountResponse { deleted_documents }))
}
