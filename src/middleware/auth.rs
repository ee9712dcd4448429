// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user gate.
//!
//! The tracker serves a single device, so the session context is the source
//! of identity rather than a bearer token.

use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;

/// The signed-in user for this request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: u64,
}

/// Middleware that rejects requests unless a (non-guest) user is signed in.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.session.user_id() {
        Some(user_id) => {
            request.extensions_mut().insert(CurrentUser { user_id });
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}
