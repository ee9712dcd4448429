// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store used for local runs and tests.

use crate::models::achievement::AchievementUnlock;
use crate::models::daily::record_document_id;
use crate::models::{Achievement, AchievementId, DailyRecord, UserProfile};
use crate::time_utils::format_utc_rfc3339;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent in-memory store with the same semantics as [`super::FirestoreDb`].
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<u64, UserProfile>>,
    /// Keyed by `{user_id}_{date}`
    records: Arc<DashMap<String, DailyRecord>>,
    /// Keyed by `{user_id}_{achievement}`
    unlocks: Arc<DashMap<String, AchievementUnlock>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, user_id: u64) -> Option<UserProfile> {
        self.users.get(&user_id).map(|u| u.value().clone())
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<UserProfile> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone())
    }

    pub fn upsert_user(&self, user: &UserProfile) {
        self.users.insert(user.user_id, user.clone());
    }

    pub fn delete_user_data(&self, user_id: u64) -> usize {
        let mut deleted = 0;

        let before = self.records.len();
        self.records.retain(|_, r| r.user_id != user_id);
        deleted += before - self.records.len();

        let before = self.unlocks.len();
        self.unlocks.retain(|_, u| u.user_id != user_id);
        deleted += before - self.unlocks.len();

        if self.users.remove(&user_id).is_some() {
            deleted += 1;
        }

        tracing::info!(user_id, deleted, "User data deletion complete");
        deleted
    }

    pub fn upsert_daily_record(&self, record: &DailyRecord) {
        self.records.insert(record.document_id(), record.clone());
    }

    pub fn get_daily_record(&self, user_id: u64, date: &str) -> Option<DailyRecord> {
        self.records
            .get(&record_document_id(user_id, date))
            .map(|r| r.value().clone())
    }

    pub fn get_daily_records_since(&self, user_id: u64, from_date: &str) -> Vec<DailyRecord> {
        let mut records: Vec<DailyRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.date.as_str() >= from_date)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date));
        records
    }

    pub fn sum_lifetime_steps(&self, user_id: u64) -> u64 {
        self.records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.steps as u64)
            .sum()
    }

    pub fn get_achievements(&self, user_id: u64) -> Vec<Achievement> {
        let unlocks: Vec<AchievementUnlock> = self
            .unlocks
            .iter()
            .filter(|u| u.user_id == user_id)
            .map(|u| u.value().clone())
            .collect();
        Achievement::catalog(&unlocks)
    }

    pub fn set_achievement_unlocked(&self, user_id: u64, achievement: u32) -> u64 {
        if AchievementId::from_number(achievement).is_none() || !self.users.contains_key(&user_id)
        {
            return 0;
        }

        let unlock = AchievementUnlock {
            user_id,
            achievement,
            unlocked_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        match self.unlocks.entry(unlock.document_id()) {
            Entry::Occupied(_) => 0,
            Entry::Vacant(slot) => {
                slot.insert(unlock);
                1
            }
        }
    }
}
