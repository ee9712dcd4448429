// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use stepps_tracker::config::Config;
use stepps_tracker::db::{Database, FirestoreDb, MemoryDb};
use stepps_tracker::models::{SampleVector, SensorEvent, UserProfile};
use stepps_tracker::routes::create_router;
use stepps_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A store whose every operation fails (offline Firestore client).
#[allow(dead_code)]
pub fn test_db_offline() -> Database {
    Database::Firestore(FirestoreDb::new_mock())
}

/// Create a test app backed by a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Database::Memory(MemoryDb::new()))
}

#[allow(dead_code)]
pub fn create_test_app_with(db: Database) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), db));
    (create_router(state.clone()), state)
}

/// Unique user ID for test isolation.
#[allow(dead_code)]
pub fn unique_user_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    nanos & ((1 << 53) - 1)
}

#[allow(dead_code)]
pub fn test_profile(user_id: u64) -> UserProfile {
    UserProfile {
        user_id,
        email: format!("walker{}@example.com", user_id),
        password_hash: String::new(),
        height_cm: 172.0,
        weight_kg: 70.0,
        age: 35,
        daily_goal: 10_000,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// `n` accelerometer samples that each register as one step.
///
/// Samples alternate between rest and a 10 m/s² jolt, 500 ms apart.
#[allow(dead_code)]
pub fn walking_samples(n: usize, start_ms: u64) -> Vec<SensorEvent> {
    (0..n)
        .map(|i| {
            let x = if i % 2 == 0 { 10.0 } else { 0.0 };
            SensorEvent::Accelerometer(SampleVector::new(x, 0.0, 0.0, start_ms + i as u64 * 500))
        })
        .collect()
}

/// Build a JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
