// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Daily records (one document per user and date)
//! - Achievements (one document per unlocked achievement)

use crate::db::collections;
use crate::error::AppError;
use crate::models::achievement::AchievementUnlock;
use crate::models::daily::record_document_id;
use crate::models::{Achievement, AchievementId, DailyRecord, UserProfile};
use crate::time_utils::format_utc_rfc3339;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by (lowercase) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let email = email.to_lowercase();
        let users: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.user_id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Daily Record Operations ─────────────────────────────────

    /// Insert or replace the daily record. The document ID makes (user, date) unique.
    pub async fn upsert_daily_record(&self, record: &DailyRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_RECORDS)
            .document_id(record.document_id())
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store multiple daily records.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_upsert_daily_records(
        &self,
        records: &[DailyRecord],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(records.to_vec())
            .map(|record| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DAILY_RECORDS)
                    .document_id(record.document_id())
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Get the record for one user and date.
    pub async fn get_daily_record(
        &self,
        user_id: u64,
        date: &str,
    ) -> Result<Option<DailyRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_RECORDS)
            .obj()
            .one(&record_document_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's records on or after `from_date`, oldest first.
    pub async fn get_daily_records_since(
        &self,
        user_id: u64,
        from_date: &str,
    ) -> Result<Vec<DailyRecord>, AppError> {
        let from_date = from_date.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_RECORDS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("date").greater_than_or_equal(from_date.clone()),
                ])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All records owned by a user.
    async fn get_all_daily_records(&self, user_id: u64) -> Result<Vec<DailyRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_RECORDS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of steps across all of a user's records.
    pub async fn sum_lifetime_steps(&self, user_id: u64) -> Result<u64, AppError> {
        let records = self.get_all_daily_records(user_id).await?;
        Ok(records.iter().map(|r| r.steps as u64).sum())
    }

    // ─── Achievement Operations ──────────────────────────────────

    async fn get_unlocks(&self, user_id: u64) -> Result<Vec<AchievementUnlock>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACHIEVEMENTS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Full achievement catalog with the user's unlock state.
    pub async fn get_achievements(&self, user_id: u64) -> Result<Vec<Achievement>, AppError> {
        let unlocks = self.get_unlocks(user_id).await?;
        Ok(Achievement::catalog(&unlocks))
    }

    /// Write an unlock document unless one already exists.
    ///
    /// Returns 1 if the achievement was newly unlocked, 0 otherwise.
    pub async fn set_achievement_unlocked(
        &self,
        user_id: u64,
        achievement: u32,
    ) -> Result<u64, AppError> {
        if AchievementId::from_number(achievement).is_none() {
            tracing::debug!(user_id, achievement, "Unknown achievement, nothing to unlock");
            return Ok(0);
        }
        if self.get_user(user_id).await?.is_none() {
            tracing::debug!(user_id, achievement, "Unknown user, nothing to unlock");
            return Ok(0);
        }

        let unlock = AchievementUnlock {
            user_id,
            achievement,
            unlocked_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        let existing: Option<AchievementUnlock> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACHIEVEMENTS)
            .obj()
            .one(&unlock.document_id())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if existing.is_some() {
            return Ok(0);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACHIEVEMENTS)
            .document_id(unlock.document_id())
            .object(&unlock)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(1)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Profile Deletion ──────────────────────────────────────────

    /// Delete a profile and everything it owns.
    ///
    /// Deletes from all collections:
    /// - `daily_records` (query by user_id)
    /// - `achievements` (query by user_id)
    /// - `users/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: u64) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Daily records
        let records = self.get_all_daily_records(user_id).await?;
        let count = records.len();
        self.batch_delete(&records, collections::DAILY_RECORDS, DailyRecord::document_id)
            .await?;
        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted daily records");

        // 2. Achievement unlocks
        let unlocks = self.get_unlocks(user_id).await?;
        let count = unlocks.len();
        self.batch_delete(
            &unlocks,
            collections::ACHIEVEMENTS,
            AchievementUnlock::document_id,
        )
        .await?;
        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted achievements");

        // 3. Profile
        if self.get_user(user_id).await?.is_some() {
            self.get_client()?
                .fluent()
                .delete()
                .from(collections::USERS)
                .document_id(user_id.to_string())
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted user profile");
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
