//! Application configuration loaded from environment variables.
//!
//! Tracking thresholds default to the values the step filter was tuned with;
//! each can be overridden per deployment.

use std::env;
use std::str::FromStr;

/// Which durable store backs the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store (data is lost on restart)
    Memory,
    /// Google Cloud Firestore
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// Step filter thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Minimum delta magnitude (m/s²) between consecutive samples to count a step
    pub threshold: f32,
    /// Minimum time between two accepted steps
    pub cooldown_ms: u64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            threshold: 8.0,
            cooldown_ms: 300,
        }
    }
}

/// Location fix filtering and checkpoint cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    pub detector: DetectorSettings,
    /// Fixes must report an accuracy radius strictly below this (meters)
    pub max_fix_accuracy_m: f32,
    /// Movement at or below this distance (meters) is treated as GPS noise
    pub min_distance_delta_m: f64,
    /// Persist running totals every N steps
    pub checkpoint_every_steps: u32,
    /// Body weight used when the session has no profile (kg)
    pub default_weight_kg: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            max_fix_accuracy_m: 20.0,
            min_distance_delta_m: 1.0,
            checkpoint_every_steps: 100,
            default_weight_kg: 70.0,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Durable store selection
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Tracking pipeline thresholds
    pub tracker: TrackerSettings,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            tracker: TrackerSettings::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Memory,
        };

        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        let defaults = TrackerSettings::default();
        let tracker = TrackerSettings {
            detector: DetectorSettings {
                threshold: parse_or("STEP_THRESHOLD", defaults.detector.threshold)?,
                cooldown_ms: parse_or("STEP_COOLDOWN_MS", defaults.detector.cooldown_ms)?,
            },
            max_fix_accuracy_m: parse_or("LOCATION_MAX_ACCURACY_M", defaults.max_fix_accuracy_m)?,
            min_distance_delta_m: parse_or("LOCATION_MIN_DELTA_M", defaults.min_distance_delta_m)?,
            checkpoint_every_steps: parse_or(
                "CHECKPOINT_EVERY_STEPS",
                defaults.checkpoint_every_steps,
            )?,
            default_weight_kg: parse_or("DEFAULT_WEIGHT_KG", defaults.default_weight_kg)?,
        };

        if tracker.checkpoint_every_steps == 0 {
            return Err(ConfigError::Invalid("CHECKPOINT_EVERY_STEPS"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            store_backend,
            gcp_project_id,
            tracker,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
