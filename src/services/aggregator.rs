// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Running totals for today's tracking session.
//!
//! Steps and distance only grow while a session runs; calories are always
//! derived from the current step count and body weight. Totals belong to a
//! single local calendar day.

use crate::models::{DailyRecord, TotalsSnapshot};
use crate::time_utils::{format_utc_rfc3339, local_date, DATE_KEY_FORMAT};
use chrono::{DateTime, NaiveDate, Utc};

/// Estimated kcal burned per step per kilogram of body weight.
pub const KCAL_PER_STEP_PER_KG: f64 = 0.00004;

/// Calories for `steps` at `weight_kg`.
pub fn calories_for(steps: u32, weight_kg: f64) -> f64 {
    steps as f64 * weight_kg * KCAL_PER_STEP_PER_KG
}

/// In-memory session accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTotals {
    pub steps: u32,
    pub calories: f64,
    pub distance_m: f64,
    /// When the current session started
    pub started_at: DateTime<Utc>,
    /// Active time carried over from an earlier session today
    pub carried_active_ms: u64,
}

impl RunningTotals {
    pub fn zero(started_at: DateTime<Utc>) -> Self {
        Self {
            steps: 0,
            calories: 0.0,
            distance_m: 0.0,
            started_at,
            carried_active_ms: 0,
        }
    }

    /// Tracked time including any carried-over time.
    pub fn active_time_ms(&self, now: DateTime<Utc>) -> u64 {
        let session_ms = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.carried_active_ms + session_ms
    }
}

/// Result of counting one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub steps: u32,
    pub calories: f64,
    /// The step count reached a checkpoint boundary
    pub checkpoint_due: bool,
}

/// Accumulates steps and distance into [`RunningTotals`].
#[derive(Debug, Clone)]
pub struct DailyAggregator {
    totals: RunningTotals,
    day: NaiveDate,
    checkpoint_every: u32,
}

impl DailyAggregator {
    pub fn new(started_at: DateTime<Utc>, checkpoint_every: u32) -> Self {
        Self {
            totals: RunningTotals::zero(started_at),
            day: local_date(started_at),
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    /// Local calendar day the totals are counted against.
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// `now` falls on a later local day than the totals.
    pub fn is_past_day(&self, now: DateTime<Utc>) -> bool {
        local_date(now) > self.day
    }

    /// Continue from a record persisted earlier today.
    pub fn resume(mut self, record: &DailyRecord, weight_kg: f64) -> Self {
        self.totals.steps = record.steps;
        self.totals.calories = calories_for(record.steps, weight_kg);
        self.totals.distance_m = record.distance_m.max(0.0);
        self.totals.carried_active_ms = record.active_time_ms;
        self
    }

    /// Count one accepted step.
    pub fn record_step(&mut self, weight_kg: f64) -> StepOutcome {
        self.totals.steps = self.totals.steps.saturating_add(1);
        self.totals.calories = calories_for(self.totals.steps, weight_kg);

        StepOutcome {
            steps: self.totals.steps,
            calories: self.totals.calories,
            checkpoint_due: self.totals.steps % self.checkpoint_every == 0,
        }
    }

    /// Add an accepted distance delta. Negative or non-finite deltas are ignored.
    pub fn add_distance(&mut self, delta_m: f64) {
        if delta_m.is_finite() && delta_m > 0.0 {
            self.totals.distance_m += delta_m;
        }
    }

    pub fn totals(&self) -> &RunningTotals {
        &self.totals
    }

    pub fn snapshot(&self, user_id: Option<u64>, now: DateTime<Utc>, tracking: bool) -> TotalsSnapshot {
        TotalsSnapshot {
            user_id,
            steps: self.totals.steps,
            calories: self.totals.calories,
            distance_m: self.totals.distance_m,
            active_time_ms: self.totals.active_time_ms(now),
            tracking,
        }
    }

    /// Record for the aggregator's day with active time measured up to `now`.
    pub fn to_record(&self, user_id: u64, now: DateTime<Utc>) -> DailyRecord {
        DailyRecord {
            user_id,
            date: self.day.format(DATE_KEY_FORMAT).to_string(),
            steps: self.totals.steps,
            calories: self.totals.calories,
            distance_m: self.totals.distance_m,
            active_time_ms: self.totals.active_time_ms(now),
            updated_at: format_utc_rfc3339(now),
        }
    }

    /// Back to zero, counting against the local day of `started_at`.
    pub fn reset(&mut self, started_at: DateTime<Utc>) {
        self.totals = RunningTotals::zero(started_at);
        self.day = local_date(started_at);
    }
}
