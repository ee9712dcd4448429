//! Database layer.
//!
//! Tracking code talks to [`Database`], which delegates to either Firestore
//! or the in-process store selected at startup.

pub mod firestore;
pub mod memory;
pub mod migration;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{Achievement, DailyRecord, UserProfile};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Daily totals (keyed by `{user_id}_{date}`)
    pub const DAILY_RECORDS: &str = "daily_records";
    /// Unlocked achievements (keyed by `{user_id}_{achievement}`)
    pub const ACHIEVEMENTS: &str = "achievements";
}

/// Store instance that delegates to the configured backend.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => Ok(Self::Firestore(
                FirestoreDb::new(&config.gcp_project_id).await?,
            )),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Self::Memory(MemoryDb::new()))
            }
        }
    }

    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "firestore",
            Self::Memory(_) => "memory",
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: u64) -> Result<Option<UserProfile>, AppError> {
        match self {
            Self::Firestore(db) => db.get_user(user_id).await,
            Self::Memory(db) => Ok(db.get_user(user_id)),
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        match self {
            Self::Firestore(db) => db.get_user_by_email(email).await,
            Self::Memory(db) => Ok(db.get_user_by_email(email)),
        }
    }

    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.upsert_user(user).await,
            Self::Memory(db) => {
                db.upsert_user(user);
                Ok(())
            }
        }
    }

    /// Delete a profile together with its daily records and achievements.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: u64) -> Result<usize, AppError> {
        match self {
            Self::Firestore(db) => db.delete_user_data(user_id).await,
            Self::Memory(db) => Ok(db.delete_user_data(user_id)),
        }
    }

    // ─── Daily Record Operations ─────────────────────────────────

    /// Insert or replace the record for `(record.user_id, record.date)`.
    pub async fn upsert_daily_record(&self, record: &DailyRecord) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.upsert_daily_record(record).await,
            Self::Memory(db) => {
                db.upsert_daily_record(record);
                Ok(())
            }
        }
    }

    pub async fn batch_upsert_daily_records(&self, records: &[DailyRecord]) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.batch_upsert_daily_records(records).await,
            Self::Memory(db) => {
                for record in records {
                    db.upsert_daily_record(record);
                }
                Ok(())
            }
        }
    }

    pub async fn get_daily_record(
        &self,
        user_id: u64,
        date: &str,
    ) -> Result<Option<DailyRecord>, AppError> {
        match self {
            Self::Firestore(db) => db.get_daily_record(user_id, date).await,
            Self::Memory(db) => Ok(db.get_daily_record(user_id, date)),
        }
    }

    /// Records on or after `from_date`, oldest first.
    pub async fn get_daily_records_since(
        &self,
        user_id: u64,
        from_date: &str,
    ) -> Result<Vec<DailyRecord>, AppError> {
        match self {
            Self::Firestore(db) => db.get_daily_records_since(user_id, from_date).await,
            Self::Memory(db) => Ok(db.get_daily_records_since(user_id, from_date)),
        }
    }

    /// Sum of steps across every record the user owns.
    pub async fn sum_lifetime_steps(&self, user_id: u64) -> Result<u64, AppError> {
        match self {
            Self::Firestore(db) => db.sum_lifetime_steps(user_id).await,
            Self::Memory(db) => Ok(db.sum_lifetime_steps(user_id)),
        }
    }

    // ─── Achievement Operations ──────────────────────────────────

    /// Full catalog with the user's unlock state.
    pub async fn get_achievements(&self, user_id: u64) -> Result<Vec<Achievement>, AppError> {
        match self {
            Self::Firestore(db) => db.get_achievements(user_id).await,
            Self::Memory(db) => Ok(db.get_achievements(user_id)),
        }
    }

    /// Mark an achievement unlocked.
    ///
    /// Returns the number of rows changed: 0 for an unknown user, an unknown
    /// achievement number, or an achievement that is already unlocked.
    pub async fn set_achievement_unlocked(
        &self,
        user_id: u64,
        achievement: u32,
    ) -> Result<u64, AppError> {
        match self {
            Self::Firestore(db) => db.set_achievement_unlocked(user_id, achievement).await,
            Self::Memory(db) => Ok(db.set_achievement_unlocked(user_id, achievement)),
        }
    }
}
