// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session context shared between the API and the tracking pipeline.
//!
//! Holds who is signed in, their tracking preferences, and the latest
//! published totals. It is created once and passed explicitly to every
//! component that needs it.

use crate::error::{AppError, Result};
use crate::models::user::DEFAULT_DAILY_GOAL;
use crate::models::{TotalsSnapshot, UserProfile};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Upper bound accepted for a daily step goal.
pub const MAX_DAILY_GOAL: u32 = 100_000;

/// Keys of the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    UserId,
    IsGuest,
    WeightKg,
    DailyGoal,
    CurrentStreak,
    IsTracking,
    TrackingStart,
}

/// Values of the session store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Int(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

/// Key-value session state plus the published totals snapshot.
#[derive(Clone)]
pub struct SessionContext {
    values: Arc<DashMap<SessionKey, SessionValue>>,
    snapshot: Arc<watch::Sender<TotalsSnapshot>>,
    default_weight_kg: f64,
}

impl SessionContext {
    pub fn new(default_weight_kg: f64) -> Self {
        let (tx, _) = watch::channel(TotalsSnapshot::default());
        Self {
            values: Arc::new(DashMap::new()),
            snapshot: Arc::new(tx),
            default_weight_kg,
        }
    }

    // ─── Raw key-value access ────────────────────────────────────

    pub fn get(&self, key: SessionKey) -> Option<SessionValue> {
        self.values.get(&key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: SessionKey, value: SessionValue) {
        self.values.insert(key, value);
    }

    pub fn remove(&self, key: SessionKey) {
        self.values.remove(&key);
    }

    fn get_int(&self, key: SessionKey) -> Option<u64> {
        match self.get(key) {
            Some(SessionValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    fn get_bool(&self, key: SessionKey) -> bool {
        matches!(self.get(key), Some(SessionValue::Bool(true)))
    }

    // ─── Identity ────────────────────────────────────────────────

    /// Signed-in user; guests and signed-out sessions have none.
    pub fn user_id(&self) -> Option<u64> {
        if self.is_guest() {
            return None;
        }
        self.get_int(SessionKey::UserId)
    }

    pub fn is_guest(&self) -> bool {
        self.get_bool(SessionKey::IsGuest)
    }

    /// Whether anyone (user or guest) is using the tracker.
    pub fn is_active(&self) -> bool {
        self.is_guest() || self.get_int(SessionKey::UserId).is_some()
    }

    /// Switch the session to `profile` and clear the published totals.
    pub fn sign_in(&self, profile: &UserProfile) {
        self.set(SessionKey::UserId, SessionValue::Int(profile.user_id));
        self.set(SessionKey::IsGuest, SessionValue::Bool(false));
        self.set(SessionKey::WeightKg, SessionValue::Float(profile.weight_kg));
        self.set(
            SessionKey::DailyGoal,
            SessionValue::Int(profile.daily_goal as u64),
        );
        self.remove(SessionKey::CurrentStreak);
        self.publish(TotalsSnapshot {
            user_id: Some(profile.user_id),
            ..TotalsSnapshot::default()
        });
    }

    /// Track without an account; nothing is persisted.
    pub fn sign_in_guest(&self) {
        self.sign_out();
        self.set(SessionKey::IsGuest, SessionValue::Bool(true));
    }

    /// Forget the user and reset the published totals.
    pub fn sign_out(&self) {
        for key in [
            SessionKey::UserId,
            SessionKey::IsGuest,
            SessionKey::WeightKg,
            SessionKey::DailyGoal,
            SessionKey::CurrentStreak,
            SessionKey::IsTracking,
            SessionKey::TrackingStart,
        ] {
            self.remove(key);
        }
        self.publish(TotalsSnapshot::default());
    }

    // ─── Preferences ─────────────────────────────────────────────

    pub fn weight_kg(&self) -> f64 {
        match self.get(SessionKey::WeightKg) {
            Some(SessionValue::Float(w)) if w > 0.0 => w,
            _ => self.default_weight_kg,
        }
    }

    pub fn daily_goal(&self) -> u32 {
        self.get_int(SessionKey::DailyGoal)
            .map(|g| g as u32)
            .unwrap_or(DEFAULT_DAILY_GOAL)
    }

    /// Set the daily goal; must be within `1..=MAX_DAILY_GOAL`.
    pub fn set_daily_goal(&self, goal: u32) -> Result<()> {
        if !(1..=MAX_DAILY_GOAL).contains(&goal) {
            return Err(AppError::BadRequest(format!(
                "Daily goal must be between 1 and {}",
                MAX_DAILY_GOAL
            )));
        }
        self.set(SessionKey::DailyGoal, SessionValue::Int(goal as u64));
        Ok(())
    }

    pub fn current_streak(&self) -> u32 {
        self.get_int(SessionKey::CurrentStreak).unwrap_or(0) as u32
    }

    pub fn set_current_streak(&self, streak: u32) {
        self.set(SessionKey::CurrentStreak, SessionValue::Int(streak as u64));
    }

    // ─── Tracking state ──────────────────────────────────────────

    pub fn is_tracking(&self) -> bool {
        self.get_bool(SessionKey::IsTracking)
    }

    pub fn tracking_start(&self) -> Option<DateTime<Utc>> {
        match self.get(SessionKey::TrackingStart) {
            Some(SessionValue::Time(t)) => Some(t),
            _ => None,
        }
    }

    pub fn mark_tracking_started(&self, started_at: DateTime<Utc>) {
        self.set(SessionKey::IsTracking, SessionValue::Bool(true));
        self.set(SessionKey::TrackingStart, SessionValue::Time(started_at));
    }

    pub fn mark_tracking_stopped(&self) {
        self.set(SessionKey::IsTracking, SessionValue::Bool(false));
        self.remove(SessionKey::TrackingStart);
    }

    // ─── Totals snapshot ─────────────────────────────────────────

    /// Latest published totals. May lag the collector slightly.
    pub fn snapshot(&self) -> TotalsSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Replace the published totals.
    pub fn publish(&self, snapshot: TotalsSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> watch::Receiver<TotalsSnapshot> {
        self.snapshot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            user_id: 5,
            email: "walker@example.com".to_string(),
            password_hash: String::new(),
            height_cm: 180.0,
            weight_kg: 82.5,
            age: 40,
            daily_goal: 8000,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_defaults_when_signed_out() {
        let session = SessionContext::new(70.0);
        assert_eq!(session.user_id(), None);
        assert!(!session.is_active());
        assert_eq!(session.weight_kg(), 70.0);
        assert_eq!(session.daily_goal(), 10_000);
        assert_eq!(session.current_streak(), 0);
        assert!(!session.is_tracking());
    }

    #[test]
    fn test_sign_in_loads_profile() {
        let session = SessionContext::new(70.0);
        session.sign_in(&profile());
        assert_eq!(session.user_id(), Some(5));
        assert_eq!(session.weight_kg(), 82.5);
        assert_eq!(session.daily_goal(), 8000);
        assert_eq!(session.snapshot().user_id, Some(5));
    }

    #[test]
    fn test_guest_has_no_user() {
        let session = SessionContext::new(70.0);
        session.sign_in(&profile());
        session.sign_in_guest();
        assert_eq!(session.user_id(), None);
        assert!(session.is_guest());
        assert!(session.is_active());
        assert_eq!(session.weight_kg(), 70.0);
    }

    #[test]
    fn test_sign_out_resets_snapshot() {
        let session = SessionContext::new(70.0);
        session.sign_in(&profile());
        session.publish(TotalsSnapshot {
            user_id: Some(5),
            steps: 1200,
            ..TotalsSnapshot::default()
        });
        session.sign_out();
        assert_eq!(session.snapshot(), TotalsSnapshot::default());
        assert!(!session.is_active());
    }

    #[test]
    fn test_daily_goal_bounds() {
        let session = SessionContext::new(70.0);
        assert!(session.set_daily_goal(0).is_err());
        assert!(session.set_daily_goal(100_001).is_err());
        session.set_daily_goal(100_000).unwrap();
        assert_eq!(session.daily_goal(), 100_000);
    }

    #[test]
    fn test_subscribers_see_published_totals() {
        let session = SessionContext::new(70.0);
        let rx = session.subscribe();
        session.publish(TotalsSnapshot {
            steps: 3,
            ..TotalsSnapshot::default()
        });
        assert_eq!(rx.borrow().steps, 3);
    }
}
