// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store behavior through the `Database` facade (in-memory backend).

use stepps_tracker::db::migration::{migrate_legacy_stats, LegacyDailyStats};
use stepps_tracker::db::{Database, MemoryDb};
use stepps_tracker::models::DailyRecord;

mod common;
use common::{test_db_offline, test_profile};

fn memory_db() -> Database {
    Database::Memory(MemoryDb::new())
}

#[tokio::test]
async fn test_upsert_same_day_keeps_one_record() {
    let db = memory_db();
    db.upsert_user(&test_profile(1)).await.unwrap();

    for steps in [100, 200, 150] {
        let record = DailyRecord {
            steps,
            ..DailyRecord::empty(1, "2024-05-01")
        };
        db.upsert_daily_record(&record).await.unwrap();
    }

    let records = db.get_daily_records_since(1, "2024-01-01").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].steps, 150);
    assert_eq!(db.sum_lifetime_steps(1).await.unwrap(), 150);
}

#[tokio::test]
async fn test_records_are_per_user() {
    let db = memory_db();
    db.upsert_daily_record(&DailyRecord {
        steps: 10,
        ..DailyRecord::empty(1, "2024-05-01")
    })
    .await
    .unwrap();
    db.upsert_daily_record(&DailyRecord {
        steps: 20,
        ..DailyRecord::empty(2, "2024-05-01")
    })
    .await
    .unwrap();

    assert_eq!(
        db.get_daily_record(1, "2024-05-01").await.unwrap().unwrap().steps,
        10
    );
    assert_eq!(db.sum_lifetime_steps(2).await.unwrap(), 20);
}

#[tokio::test]
async fn test_unlock_unknown_user_or_achievement_is_noop() {
    let db = memory_db();
    db.upsert_user(&test_profile(1)).await.unwrap();

    assert_eq!(db.set_achievement_unlocked(99, 1).await.unwrap(), 0);
    assert_eq!(db.set_achievement_unlocked(1, 42).await.unwrap(), 0);
    assert_eq!(db.set_achievement_unlocked(1, 2).await.unwrap(), 1);
    assert_eq!(db.set_achievement_unlocked(1, 2).await.unwrap(), 0);

    let achievements = db.get_achievements(1).await.unwrap();
    assert_eq!(achievements.len(), 3);
    assert!(achievements[1].unlocked);
    assert!(achievements[1].unlocked_at.is_some());
}

#[tokio::test]
async fn test_migrate_legacy_stats() {
    let db = memory_db();
    db.upsert_user(&test_profile(7)).await.unwrap();

    let legacy: Vec<LegacyDailyStats> = serde_json::from_value(serde_json::json!([
        {"date": "2024-02-01", "steps": 4000, "calories": 11.2, "distance": 3000.0, "time": 1800000},
        {"date": "2024-02-02", "steps": 800},
        {"date": "2024-02-02", "steps": 1200},
        {"date": "02/03/2024", "steps": 999}
    ]))
    .unwrap();

    let written = migrate_legacy_stats(&db, 7, &legacy).await.unwrap();
    assert_eq!(written, 2);

    let records = db.get_daily_records_since(7, "2024-01-01").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, "2024-02-01");
    assert_eq!(records[0].distance_m, 3000.0);
    assert_eq!(records[0].active_time_ms, 1_800_000);
    assert_eq!(records[1].steps, 1200);
    assert_eq!(db.sum_lifetime_steps(7).await.unwrap(), 5200);
}

#[tokio::test]
async fn test_delete_user_data_cascades() {
    let db = memory_db();
    db.upsert_user(&test_profile(3)).await.unwrap();
    db.upsert_user(&test_profile(4)).await.unwrap();
    db.batch_upsert_daily_records(&[
        DailyRecord::empty(3, "2024-05-01"),
        DailyRecord::empty(3, "2024-05-02"),
        DailyRecord::empty(4, "2024-05-01"),
    ])
    .await
    .unwrap();
    db.set_achievement_unlocked(3, 1).await.unwrap();

    // Profile, two records, one achievement
    assert_eq!(db.delete_user_data(3).await.unwrap(), 4);
    assert!(db.get_user(3).await.unwrap().is_none());
    assert!(db.get_daily_records_since(3, "2024-01-01").await.unwrap().is_empty());
    assert!(db.get_user(4).await.unwrap().is_some());
    assert!(db.get_daily_record(4, "2024-05-01").await.unwrap().is_some());
}

#[tokio::test]
async fn test_offline_store_reports_database_errors() {
    let db = test_db_offline();
    assert_eq!(db.backend_name(), "firestore");
    let err = db
        .upsert_daily_record(&DailyRecord::empty(1, "2024-05-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, stepps_tracker::error::AppError::Database(_)));
}
