// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log models: food logs, workouts, cardio sessions, weight logs.
//!
//! Food logs qualify toward the food streak; workouts and cardio sessions
//! both qualify toward the exercise streak. Every log carries a `log_date`,
//! the client-local calendar day it counts toward, separate from the
//! `created_at` server timestamp.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A logged food item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLog {
    /// Random ID (also used as document ID)
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Food name/description
    pub name: String,
    /// Energy in kcal
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Calendar day this log counts toward ("YYYY-MM-DD")
    pub log_date: NaiveDate,
    /// When this log was created (ISO 8601)
    pub created_at: String,
}

/// A logged strength workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    /// Workout name (e.g. "Push day")
    pub name: String,
    pub duration_min: f64,
    pub log_date: NaiveDate,
    pub created_at: String,
}

/// A logged cardio session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardioSession {
    pub id: String,
    pub user_id: String,
    /// Activity type (Running, Cycling, etc.)
    pub activity: String,
    pub duration_min: f64,
    /// Estimated energy burned in kcal
    pub calories_burned: f64,
    pub log_date: NaiveDate,
    pub created_at: String,
}

/// A body-weight measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightLog {
    pub id: String,
    pub user_id: String,
    pub weight_kg: f64,
    pub log_date: NaiveDate,
    pub created_at: String,
}
