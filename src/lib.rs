// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stepps: a single-device step, distance and calorie tracker.
//!
//! Accelerometer samples and location fixes feed a single-writer collector
//! that maintains today's running totals, checkpoints them to a durable
//! per-user store, and unlocks milestone achievements.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{Notifier, ProfileService, SessionContext, TrackingService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub session: SessionContext,
    pub notifier: Notifier,
    pub profiles: ProfileService,
    pub tracker: TrackingService,
}

impl AppState {
    /// Wire the services around one store and one session.
    pub fn new(config: Config, db: Database) -> Self {
        let session = SessionContext::new(config.tracker.default_weight_kg);
        let notifier = Notifier::new();
        let profiles = ProfileService::new(db.clone());
        let tracker = TrackingService::new(
            db.clone(),
            session.clone(),
            notifier.clone(),
            config.tracker.clone(),
        );
        Self {
            config,
            db,
            session,
            notifier,
            profiles,
            tracker,
        }
    }
}
