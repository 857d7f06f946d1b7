// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use kcal_tracker::config::Config;
use kcal_tracker::db::FirestoreDb;
use kcal_tracker::models::UserProfile;
use kcal_tracker::routes::create_router;
use kcal_tracker::services::{cache::SwrCache, FoodParserClient, StreakService};
use kcal_tracker::AppState;
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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build a streak service over the given database.
#[allow(dead_code)]
pub fn test_streak_service(db: FirestoreDb) -> StreakService {
    let cache = Arc::new(SwrCache::new(chrono::Duration::seconds(60)));
    StreakService::new(db, cache)
}

/// A minimal stored profile for a test user.
#[allow(dead_code)]
pub fn test_profile(user_id: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        email: Some("test@example.com".to_string()),
        display_name: "Test User".to_string(),
        sex: None,
        age: None,
        height_cm: None,
        weight_kg: None,
        activity_level: None,
        weight_goal: None,
        start_weight_kg: None,
        target_weight_kg: None,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Create a session JWT for a test user.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    kcal_tracker::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create JWT")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let streaks = test_streak_service(db.clone());
    let parser = FoodParserClient::new(
        config.genai_api_key.clone(),
        config.genai_model.clone(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        streaks,
        parser,
    });

    (create_router(state.clone()), state)
}
