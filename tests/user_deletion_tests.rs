// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Integration tests for user deletion.
//!
//! These tests require the Firestore emulator to be running.

use chrono::NaiveDate;
use kcal_tracker::models::streak::StreakDomain;
use kcal_tracker::models::{CardioSession, WeightLog};

mod common;
use common::{test_db, test_profile, test_streak_service};

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("delete-me-{}", nanos)
}

#[tokio::test]
async fn test_delete_user_data_removes_all_records() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Create profile
    db.upsert_profile(&test_profile(&user_id)).await.unwrap();

    // 2. Create logs in every collection
    let service = test_streak_service(db.clone());

    let food = kcal_tracker::models::FoodLog {
        id: "del-food-1".to_string(),
        user_id: user_id.clone(),
        name: "Last meal".to_string(),
        calories: 400.0,
        protein_g: 20.0,
        carbs_g: 40.0,
        fat_g: 15.0,
        log_date: day,
        created_at: now.clone(),
    };
    service.record_food_log(&food, day).await.unwrap();

    let cardio = CardioSession {
        id: "del-cardio-1".to_string(),
        user_id: user_id.clone(),
        activity: "Running".to_string(),
        duration_min: 30.0,
        calories_burned: 300.0,
        log_date: day,
        created_at: now.clone(),
    };
    service.record_cardio(&cardio, day).await.unwrap();

    let weight = WeightLog {
        id: "del-weight-1".to_string(),
        user_id: user_id.clone(),
        weight_kg: 72.5,
        log_date: day,
        created_at: now.clone(),
    };
    db.set_weight_log(&weight).await.unwrap();

    // Verify everything exists before deletion
    assert!(db.get_profile(&user_id).await.unwrap().is_some());
    assert!(db.get_food_log("del-food-1").await.unwrap().is_some());
    assert!(db
        .get_streak(&user_id, StreakDomain::Food)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .get_streak(&user_id, StreakDomain::Exercise)
        .await
        .unwrap()
        .is_some());
    assert!(db.get_latest_weight(&user_id).await.unwrap().is_some());

    // 3. Execute Deletion (GDPR method)
    let count = db.delete_user_data(&user_id).await.unwrap();
    // food + cardio + weight + 2 streaks + profile
    assert!(count >= 6, "Expected at least 6 deletions, got {}", count);

    // Verify everything is gone
    assert!(db.get_profile(&user_id).await.unwrap().is_none());
    assert!(db.get_food_log("del-food-1").await.unwrap().is_none());
    assert!(db
        .get_streak(&user_id, StreakDomain::Food)
        .await
        .unwrap()
        .is_none());
    assert!(db
        .get_streak(&user_id, StreakDomain::Exercise)
        .await
        .unwrap()
        .is_none());
    assert!(db.get_latest_weight(&user_id).await.unwrap().is_none());
    assert!(db
        .list_qualifying_dates(&user_id, StreakDomain::Exercise)
        .await
        .unwrap()
        .is_empty());
}
