// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard routes: today's progress, goal, history and achievements.

use crate::db::migration::{migrate_legacy_stats, LegacyDailyStats};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::user::ProfileResponse;
use crate::models::{Achievement, DailyRecord, History, TotalsSnapshot};
use crate::services::profile::GoalRequest;
use crate::time_utils::{date_key, format_utc_rfc3339, local_date, trailing_date_keys};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// Days shown in the history view.
const HISTORY_DAYS: u32 = 7;

/// Routes open to users and guests.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/today", get(get_today))
        .route("/api/goal", put(set_goal))
}

/// Routes that need a signed-in user (gated in routes/mod.rs).
pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/history", get(get_history))
        .route("/api/achievements", get(get_achievements))
        .route("/api/import/legacy", post(import_legacy))
}

// ─── Progress ────────────────────────────────────────────────

/// Percent of `goal` reached, capped at 100. A zero goal is 0 %.
pub fn goal_progress_percent(steps: u32, goal: u32) -> u32 {
    if goal == 0 {
        return 0;
    }
    ((steps as u64 * 100 / goal as u64).min(100)) as u32
}

pub fn motivational_message(steps: u32, goal: u32) -> &'static str {
    if steps == 0 {
        "Let's get moving!"
    } else if steps < goal / 4 {
        "Great start! Keep going!"
    } else if steps < goal / 2 {
        "You're making progress!"
    } else if steps < goal * 3 / 4 {
        "Halfway there! You can do it!"
    } else if steps < goal {
        "Almost there! Keep pushing!"
    } else {
        "Goal achieved! Amazing work!"
    }
}

#[derive(Serialize)]
pub struct TodayResponse {
    pub date: String,
    #[serde(flatten)]
    pub totals: TotalsSnapshot,
    pub daily_goal: u32,
    pub progress_percent: u32,
    pub current_streak: u32,
    pub message: &'static str,
    /// When the running session started (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_since: Option<String>,
}

/// Today's totals: live while tracking, otherwise the persisted record.
async fn get_today(State(state): State<Arc<AppState>>) -> Result<Json<TodayResponse>> {
    let now = state.tracker.now();
    let date = date_key(now);

    let mut totals = state.session.snapshot();
    if !totals.tracking {
        if let Some(user_id) = state.session.user_id() {
            if let Some(record) = state.db.get_daily_record(user_id, &date).await? {
                totals = TotalsSnapshot {
                    user_id: Some(user_id),
                    steps: record.steps,
                    calories: record.calories,
                    distance_m: record.distance_m,
                    active_time_ms: record.active_time_ms,
                    tracking: false,
                };
            }
        }
    }

    let daily_goal = state.session.daily_goal();
    Ok(Json(TodayResponse {
        date,
        progress_percent: goal_progress_percent(totals.steps, daily_goal),
        message: motivational_message(totals.steps, daily_goal),
        current_streak: state.session.current_streak(),
        tracking_since: state.session.tracking_start().map(format_utc_rfc3339),
        daily_goal,
        totals,
    }))
}

#[derive(Serialize)]
pub struct GoalResponse {
    pub daily_goal: u32,
}

/// Change the daily goal; persisted for signed-in users.
async fn set_goal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoalRequest>,
) -> Result<Json<GoalResponse>> {
    request.validate()?;
    if !state.session.is_active() {
        return Err(AppError::Unauthorized);
    }

    state.session.set_daily_goal(request.daily_goal)?;
    if let Some(user_id) = state.session.user_id() {
        state
            .profiles
            .update_daily_goal(user_id, request.daily_goal)
            .await?;
    }

    Ok(Json(GoalResponse {
        daily_goal: request.daily_goal,
    }))
}

// ─── User Data ───────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(ProfileResponse::from(&profile)))
}

/// Last seven days, oldest first, with missing days as zero.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<History>> {
    let keys = trailing_date_keys(local_date(state.tracker.now()), HISTORY_DAYS);
    let Some(first) = keys.first() else {
        return Ok(Json(History::from_days(Vec::new())));
    };

    let records = state
        .db
        .get_daily_records_since(user.user_id, first)
        .await?;

    let days: Vec<DailyRecord> = keys
        .iter()
        .map(|key| {
            records
                .iter()
                .find(|r| &r.date == key)
                .cloned()
                .unwrap_or_else(|| DailyRecord::empty(user.user_id, key))
        })
        .collect();

    Ok(Json(History::from_days(days)))
}

async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Achievement>>> {
    Ok(Json(state.db.get_achievements(user.user_id).await?))
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub current_streak: u32,
}

/// Import rows from the single-user schema into the signed-in user's records.
async fn import_legacy(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(rows): Json<Vec<LegacyDailyStats>>,
) -> Result<Json<ImportResponse>> {
    if state.tracker.is_running().await {
        return Err(AppError::Conflict(
            "Stop tracking before importing".to_string(),
        ));
    }

    let imported = migrate_legacy_stats(&state.db, user.user_id, &rows).await?;
    state.tracker.refresh_progress(user.user_id).await;

    Ok(Json(ImportResponse {
        imported,
        current_streak: state.session.current_streak(),
    }))
}
