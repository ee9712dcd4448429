// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement evaluation and unlocking.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Achievement, AchievementId, DailyRecord};
use crate::services::notifier::{Notifier, TrackerNotification};
use crate::time_utils::{parse_date_key, DATE_KEY_FORMAT};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// Lifetime steps for "First 1K Steps".
pub const FIRST_THOUSAND_STEPS: u64 = 1_000;
/// Lifetime steps for "10K Master".
pub const TEN_THOUSAND_STEPS: u64 = 10_000;
/// Consecutive active days for "Week Streak".
pub const WEEK_STREAK_DAYS: u32 = 7;

/// How far back streaks are counted.
const STREAK_LOOKBACK_DAYS: i64 = 60;

/// Achievements whose conditions hold. Says nothing about what is already unlocked.
pub fn evaluate(lifetime_steps: u64, streak: u32) -> Vec<AchievementId> {
    let mut qualifying = Vec::new();
    if lifetime_steps >= FIRST_THOUSAND_STEPS {
        qualifying.push(AchievementId::FirstThousand);
    }
    if lifetime_steps >= TEN_THOUSAND_STEPS {
        qualifying.push(AchievementId::TenThousand);
    }
    if streak >= WEEK_STREAK_DAYS {
        qualifying.push(AchievementId::WeekStreak);
    }
    qualifying
}

/// Consecutive days with steps, ending today.
///
/// If today has no steps yet the streak may still end yesterday.
pub fn current_streak(records: &[DailyRecord], today: NaiveDate) -> u32 {
    let active: HashSet<NaiveDate> = records
        .iter()
        .filter(|r| r.steps > 0)
        .filter_map(|r| parse_date_key(&r.date))
        .collect();

    let mut day = if active.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while active.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Unlocks achievements in the store and notifies listeners.
#[derive(Clone)]
pub struct AchievementService {
    db: Database,
    notifier: Notifier,
}

impl AchievementService {
    pub fn new(db: Database, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Recompute the user's streak from recent records.
    pub async fn load_streak(&self, user_id: u64, today: NaiveDate) -> Result<u32, AppError> {
        let from = (today - Duration::days(STREAK_LOOKBACK_DAYS))
            .format(DATE_KEY_FORMAT)
            .to_string();
        let records = self.db.get_daily_records_since(user_id, &from).await?;
        Ok(current_streak(&records, today))
    }

    /// Unlock everything the user now qualifies for.
    ///
    /// Returns only achievements unlocked by this call.
    pub async fn check_and_unlock(
        &self,
        user_id: u64,
        streak: u32,
    ) -> Result<Vec<Achievement>, AppError> {
        let lifetime_steps = self.db.sum_lifetime_steps(user_id).await?;
        let qualifying = evaluate(lifetime_steps, streak);
        if qualifying.is_empty() {
            return Ok(Vec::new());
        }

        let mut unlocked = Vec::new();
        for id in qualifying {
            let rows = self.db.set_achievement_unlocked(user_id, id.number()).await?;
            if rows == 1 {
                unlocked.push(id.number());
            }
        }

        if unlocked.is_empty() {
            return Ok(Vec::new());
        }

        let newly: Vec<Achievement> = self
            .db
            .get_achievements(user_id)
            .await?
            .into_iter()
            .filter(|a| unlocked.contains(&a.id))
            .collect();

        for achievement in &newly {
            tracing::info!(
                user_id,
                achievement = achievement.id,
                title = %achievement.title,
                lifetime_steps,
                "Achievement unlocked"
            );
            self.notifier.notify(TrackerNotification::AchievementUnlocked {
                user_id,
                achievement: achievement.clone(),
            });
        }

        Ok(newly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::UserProfile;

    fn record(date: &str, steps: u32) -> DailyRecord {
        DailyRecord {
            steps,
            ..DailyRecord::empty(1, date)
        }
    }

    fn day(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    #[test]
    fn test_evaluate_thresholds() {
        assert!(evaluate(999, 0).is_empty());
        assert_eq!(evaluate(1000, 0), vec![AchievementId::FirstThousand]);
        assert_eq!(
            evaluate(10_000, 0),
            vec![AchievementId::FirstThousand, AchievementId::TenThousand]
        );
        assert_eq!(evaluate(0, 7), vec![AchievementId::WeekStreak]);
        assert!(evaluate(0, 6).is_empty());
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let records: Vec<DailyRecord> = ["2024-01-13", "2024-01-14", "2024-01-15"]
            .iter()
            .map(|d| record(d, 500))
            .collect();
        assert_eq!(current_streak(&records, day("2024-01-15")), 3);
    }

    #[test]
    fn test_streak_may_end_yesterday() {
        let records = vec![
            record("2024-01-13", 500),
            record("2024-01-14", 500),
            record("2024-01-15", 0),
        ];
        assert_eq!(current_streak(&records, day("2024-01-15")), 2);
    }

    #[test]
    fn test_streak_broken_by_gap() {
        let records = vec![
            record("2024-01-10", 500),
            record("2024-01-11", 500),
            record("2024-01-13", 500),
            record("2024-01-14", 500),
        ];
        assert_eq!(current_streak(&records, day("2024-01-14")), 2);
        assert_eq!(current_streak(&records, day("2024-01-16")), 0);
    }

    #[test]
    fn test_streak_ignores_bad_dates() {
        let records = vec![record("not-a-date", 500), record("2024-01-15", 10)];
        assert_eq!(current_streak(&records, day("2024-01-15")), 1);
    }

    fn user(id: u64) -> UserProfile {
        UserProfile {
            user_id: id,
            email: format!("user{}@example.com", id),
            password_hash: String::new(),
            height_cm: 170.0,
            weight_kg: 70.0,
            age: 30,
            daily_goal: 10_000,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_check_and_unlock_is_monotonic() {
        let mem = MemoryDb::new();
        mem.upsert_user(&user(1));
        mem.upsert_daily_record(&record("2024-01-15", 1200));
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let service = AchievementService::new(Database::Memory(mem), notifier);

        let first = service.check_and_unlock(1, 0).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, 1);
        assert!(first[0].unlocked);

        match rx.try_recv().unwrap() {
            TrackerNotification::AchievementUnlocked { user_id, achievement } => {
                assert_eq!(user_id, 1);
                assert_eq!(achievement.id, 1);
            }
            other => panic!("unexpected notification {:?}", other),
        }

        // Already unlocked: nothing new, no notification.
        assert!(service.check_and_unlock(1, 0).await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_load_streak_unlocks_week_streak() {
        let mem = MemoryDb::new();
        mem.upsert_user(&user(1));
        for d in 9..=15 {
            mem.upsert_daily_record(&record(&format!("2024-01-{:02}", d), 100));
        }
        let service = AchievementService::new(Database::Memory(mem), Notifier::new());

        let streak = service.load_streak(1, day("2024-01-15")).await.unwrap();
        assert_eq!(streak, 7);

        let unlocked = service.check_and_unlock(1, streak).await.unwrap();
        assert_eq!(unlocked.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn test_check_and_unlock_unknown_user() {
        let service = AchievementService::new(Database::Memory(MemoryDb::new()), Notifier::new());
        assert!(service.check_and_unlock(42, 10).await.unwrap().is_empty());
    }
}
