//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// Default daily step goal for new profiles.
pub const DEFAULT_DAILY_GOAL: u32 = 10_000;

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID (also used as document ID)
    pub user_id: u64,
    /// Email address (unique, stored lowercase)
    pub email: String,
    /// PBKDF2 hash, `base64(salt)$base64(hash)`
    pub password_hash: String,
    /// Height in centimeters
    pub height_cm: f64,
    /// Weight in kilograms (used for calorie estimates)
    pub weight_kg: f64,
    pub age: u32,
    /// Daily step goal
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    /// When the profile was created
    pub created_at: String,
}

fn default_daily_goal() -> u32 {
    DEFAULT_DAILY_GOAL
}

/// Profile fields safe to return from the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user_id: u64,
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: u32,
    pub daily_goal: u32,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email.clone(),
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            age: profile.age,
            daily_goal: profile.daily_goal,
        }
    }
}
