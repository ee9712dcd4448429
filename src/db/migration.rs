// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schema migration from single-user (v1) daily stats to per-user (v2) records.
//!
//! Version 1 stored one row per date with no owner. Version 2 keys every
//! record by `(user_id, date)`. Migrating assigns the legacy rows to the
//! user who signs in on the device, through `POST /api/import/legacy`.

use crate::db::Database;
use crate::error::AppError;
use crate::models::DailyRecord;
use crate::time_utils::{format_utc_rfc3339, parse_date_key};
use serde::{Deserialize, Serialize};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Daily row as written by schema version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDailyStats {
    pub date: String,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub distance: f64,
    /// Active time in milliseconds
    #[serde(default)]
    pub time: u64,
}

/// Convert legacy rows into records owned by `user_id`.
///
/// Rows with an unparseable date are skipped. When the legacy table holds
/// duplicate dates the row with the most steps wins, so the result keeps
/// at most one record per date.
pub fn upgrade_legacy_stats(user_id: u64, legacy: &[LegacyDailyStats]) -> Vec<DailyRecord> {
    let now = format_utc_rfc3339(chrono::Utc::now());
    let mut records: Vec<DailyRecord> = Vec::with_capacity(legacy.len());

    for row in legacy {
        if parse_date_key(&row.date).is_none() {
            tracing::warn!(user_id, date = %row.date, "Skipping legacy row with invalid date");
            continue;
        }

        let record = DailyRecord {
            user_id,
            date: row.date.clone(),
            steps: row.steps,
            calories: row.calories,
            distance_m: row.distance,
            active_time_ms: row.time,
            updated_at: now.clone(),
        };

        match records.iter_mut().find(|r| r.date == record.date) {
            Some(existing) if existing.steps < record.steps => *existing = record,
            Some(_) => {}
            None => records.push(record),
        }
    }

    records.sort_by(|a, b| a.date.cmp(&b.date));
    records
}

/// Import legacy rows for `user_id` into the store.
///
/// Returns the number of records written.
pub async fn migrate_legacy_stats(
    db: &Database,
    user_id: u64,
    legacy: &[LegacyDailyStats],
) -> Result<usize, AppError> {
    let records = upgrade_legacy_stats(user_id, legacy);
    db.batch_upsert_daily_records(&records).await?;

    tracing::info!(
        user_id,
        imported = records.len(),
        skipped = legacy.len() - records.len(),
        to_version = SCHEMA_VERSION,
        "Legacy daily stats migrated"
    );

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(date: &str, steps: u32) -> LegacyDailyStats {
        LegacyDailyStats {
            date: date.to_string(),
            steps,
            calories: steps as f64 * 0.0028,
            distance: 0.0,
            time: 60_000,
        }
    }

    #[test]
    fn test_upgrade_assigns_owner() {
        let records = upgrade_legacy_stats(42, &[legacy("2024-01-02", 500)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, 42);
        assert_eq!(records[0].steps, 500);
        assert_eq!(records[0].active_time_ms, 60_000);
    }

    #[test]
    fn test_upgrade_skips_invalid_dates() {
        let records = upgrade_legacy_stats(1, &[legacy("yesterday", 10), legacy("2024-01-02", 5)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2024-01-02");
    }

    #[test]
    fn test_upgrade_collapses_duplicate_dates() {
        let records = upgrade_legacy_stats(
            1,
            &[
                legacy("2024-01-03", 10),
                legacy("2024-01-02", 300),
                legacy("2024-01-03", 700),
                legacy("2024-01-03", 20),
            ],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2024-01-02");
        assert_eq!(records[1].steps, 700);
    }

    #[test]
    fn test_legacy_row_deserializes_with_defaults() {
        let row: LegacyDailyStats = serde_json::from_str(r#"{"date": "2024-01-02"}"#).unwrap();
        assert_eq!(row.steps, 0);
        assert_eq!(row.time, 0);
    }
}
