//! Daily activity aggregates for dashboard and history queries.

use serde::{Deserialize, Serialize};

/// Persisted totals for one user on one calendar date.
///
/// Stored at: `daily_records/{user_id}_{date}`
///
/// There is at most one record per (user, date); writes replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Owning user
    pub user_id: u64,
    /// Local calendar date ("YYYY-MM-DD")
    pub date: String,
    #[serde(default)]
    pub steps: u32,
    /// Estimated kcal burned
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub distance_m: f64,
    /// Time spent tracking (milliseconds)
    #[serde(default)]
    pub active_time_ms: u64,
    /// Last write timestamp (ISO 8601)
    #[serde(default)]
    pub updated_at: String,
}

impl DailyRecord {
    /// Zero-valued record used to fill days without activity.
    pub fn empty(user_id: u64, date: &str) -> Self {
        Self {
            user_id,
            date: date.to_string(),
            steps: 0,
            calories: 0.0,
            distance_m: 0.0,
            active_time_ms: 0,
            updated_at: String::new(),
        }
    }

    /// Document ID combining owner and date.
    pub fn document_id(&self) -> String {
        record_document_id(self.user_id, &self.date)
    }
}

/// Document ID for the record of `user_id` on `date`.
pub fn record_document_id(user_id: u64, date: &str) -> String {
    format!("{}_{}", user_id, date)
}

/// Copy of the running totals handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalsSnapshot {
    /// Signed-in user, `None` for guests
    pub user_id: Option<u64>,
    pub steps: u32,
    pub calories: f64,
    pub distance_m: f64,
    pub active_time_ms: u64,
    /// Whether a tracking session is running
    pub tracking: bool,
}

/// Seven-day history with summary figures.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    /// One entry per day, oldest first
    pub days: Vec<DailyRecord>,
    pub total_steps: u64,
    pub average_steps: u64,
    pub best_day_steps: u32,
}

impl History {
    pub fn from_days(days: Vec<DailyRecord>) -> Self {
        let total_steps: u64 = days.iter().map(|d| d.steps as u64).sum();
        let average_steps = if days.is_empty() {
            0
        } else {
            total_steps / days.len() as u64
        };
        let best_day_steps = days.iter().map(|d| d.steps).max().unwrap_or(0);

        Self {
            days,
            total_steps,
            average_steps,
            best_day_steps,
        }
    }
}
