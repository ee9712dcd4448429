// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Milestone achievements.

use serde::{Deserialize, Serialize};

/// The fixed achievement catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstThousand,
    TenThousand,
    WeekStreak,
}

impl AchievementId {
    pub const ALL: [AchievementId; 3] = [
        AchievementId::FirstThousand,
        AchievementId::TenThousand,
        AchievementId::WeekStreak,
    ];

    /// Stable numeric ID used by the store.
    pub fn number(self) -> u32 {
        match self {
            AchievementId::FirstThousand => 1,
            AchievementId::TenThousand => 2,
            AchievementId::WeekStreak => 3,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.number() == number)
    }

    pub fn title(self) -> &'static str {
        match self {
            AchievementId::FirstThousand => "First 1K Steps",
            AchievementId::TenThousand => "10K Master",
            AchievementId::WeekStreak => "Week Streak",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementId::FirstThousand => "Take your first 1,000 steps",
            AchievementId::TenThousand => "Reach 10,000 steps",
            AchievementId::WeekStreak => "7 consecutive active days",
        }
    }
}

/// Per-user unlock state stored at `achievements/{user_id}_{number}`.
///
/// Only unlocked achievements have a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementUnlock {
    pub user_id: u64,
    pub achievement: u32,
    /// When the achievement was unlocked (ISO 8601)
    pub unlocked_at: String,
}

impl AchievementUnlock {
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.user_id, self.achievement)
    }
}

/// Catalog entry merged with a user's unlock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

impl Achievement {
    pub fn locked(id: AchievementId) -> Self {
        Self {
            id: id.number(),
            title: id.title().to_string(),
            description: id.description().to_string(),
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// Build the full catalog for a user from their unlock documents.
    pub fn catalog(unlocks: &[AchievementUnlock]) -> Vec<Self> {
        AchievementId::ALL
            .into_iter()
            .map(|id| {
                let mut entry = Self::locked(id);
                if let Some(unlock) = unlocks.iter().find(|u| u.achievement == id.number()) {
                    entry.unlocked = true;
                    entry.unlocked_at = Some(unlock.unlocked_at.clone());
                }
                entry
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round_trip() {
        for id in AchievementId::ALL {
            assert_eq!(AchievementId::from_number(id.number()), Some(id));
        }
        assert_eq!(AchievementId::from_number(0), None);
        assert_eq!(AchievementId::from_number(4), None);
    }

    #[test]
    fn test_catalog_merges_unlocks() {
        let unlocks = vec![AchievementUnlock {
            user_id: 1,
            achievement: 2,
            unlocked_at: "2024-01-15T10:00:00Z".to_string(),
        }];

        let catalog = Achievement::catalog(&unlocks);

        assert_eq!(catalog.len(), 3);
        assert!(!catalog[0].unlocked);
        assert!(catalog[1].unlocked);
        assert_eq!(catalog[1].title, "10K Master");
        assert_eq!(
            catalog[1].unlocked_at.as_deref(),
            Some("2024-01-15T10:00:00Z")
        );
        assert!(!catalog[2].unlocked);
    }
}
