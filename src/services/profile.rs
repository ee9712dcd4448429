// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login and profile updates.

use crate::db::Database;
use crate::error::AppError;
use crate::models::user::DEFAULT_DAILY_GOAL;
use crate::models::UserProfile;
use crate::time_utils::format_utc_rfc3339;
use base64::{engine::general_purpose::STANDARD, Engine};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::num::NonZeroU32;
use validator::Validate;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// User IDs stay within the integer range every client can represent.
const USER_ID_MASK: u64 = (1 << 53) - 1;

/// New account details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(range(min = 50.0, max = 300.0))]
    pub height_cm: f64,
    #[validate(range(min = 1.0, max = 500.0))]
    pub weight_kg: f64,
    #[validate(range(min = 1, max = 150))]
    pub age: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// New daily step goal.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GoalRequest {
    #[validate(range(min = 1, max = 100_000))]
    pub daily_goal: u32,
}

/// Hash a password as `base64(salt)$base64(hash)`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| anyhow::anyhow!("System RNG failure while hashing password"))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        iterations(),
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!("{}${}", STANDARD.encode(salt), STANDARD.encode(hash)))
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, hash)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD.decode(salt), STANDARD.decode(hash)) else {
        return false;
    };
    pbkdf2::verify(PBKDF2_ALG, iterations(), &salt, password.as_bytes(), &hash).is_ok()
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

fn generate_user_id() -> Result<u64, AppError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 8];
    rng.fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("System RNG failure while allocating user ID"))?;
    Ok((u64::from_le_bytes(bytes) & USER_ID_MASK).max(1))
}

/// Account operations against the store.
#[derive(Clone)]
pub struct ProfileService {
    db: Database,
}

impl ProfileService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an account. Emails are unique, compared case-insensitively.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let profile = UserProfile {
            user_id: generate_user_id()?,
            email,
            password_hash: hash_password(&request.password)?,
            height_cm: request.height_cm,
            weight_kg: request.weight_kg,
            age: request.age,
            daily_goal: DEFAULT_DAILY_GOAL,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        self.db.upsert_user(&profile).await?;

        tracing::info!(user_id = profile.user_id, "Registered new user");
        Ok(profile)
    }

    /// Check credentials and return the matching profile.
    pub async fn login(&self, request: LoginRequest) -> Result<UserProfile, AppError> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let Some(profile) = self.db.get_user_by_email(&email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(&request.password, &profile.password_hash) {
            tracing::debug!(user_id = profile.user_id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(profile)
    }

    /// Persist a new daily goal on the user's profile.
    pub async fn update_daily_goal(&self, user_id: u64, goal: u32) -> Result<(), AppError> {
        let mut profile = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        profile.daily_goal = goal;
        self.db.upsert_user(&profile).await
    }

    /// Delete the account with its records and achievements.
    pub async fn delete_account(&self, user_id: u64) -> Result<usize, AppError> {
        let deleted = self.db.delete_user_data(user_id).await?;
        tracing::info!(user_id, deleted, "Deleted account");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            height_cm: 175.0,
            weight_kg: 72.0,
            age: 33,
        }
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.contains('$'));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        assert_ne!(
            hash_password("same").unwrap(),
            hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "!!!$???"));
    }

    #[test]
    fn test_register_validation() {
        let mut short = register_request("a@example.com");
        short.password = "abc".to_string();
        short.confirm_password = "abc".to_string();
        assert!(short.validate().is_err());

        let mut mismatch = register_request("a@example.com");
        mismatch.confirm_password = "other1".to_string();
        assert!(mismatch.validate().is_err());

        assert!(register_request("not-an-email").validate().is_err());
        assert!(register_request("a@example.com").validate().is_ok());
    }

    #[test]
    fn test_goal_bounds() {
        assert!(GoalRequest { daily_goal: 0 }.validate().is_err());
        assert!(GoalRequest { daily_goal: 100_001 }.validate().is_err());
        assert!(GoalRequest { daily_goal: 100_000 }.validate().is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = ProfileService::new(Database::Memory(MemoryDb::new()));
        let created = service
            .register(register_request("Walker@Example.com"))
            .await
            .unwrap();
        assert_eq!(created.email, "walker@example.com");
        assert!(created.user_id > 0 && created.user_id <= USER_ID_MASK);

        let dup = service.register(register_request("walker@example.com")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let login = service
            .login(LoginRequest {
                email: "WALKER@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user_id, created.user_id);

        let wrong = service
            .login(LoginRequest {
                email: "walker@example.com".to_string(),
                password: "secret2".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
    }
}
