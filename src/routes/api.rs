// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::profile::{ActivityLevel, Sex, WeightGoal};
use crate::models::streak::{ActivityStreak, StreakDomain};
use crate::models::{CardioSession, FoodLog, UserProfile, WeightLog, Workout};
use crate::services::energy;
use crate::services::food_parser::ParsedFood;
use crate::time_utils::{format_utc_rfc3339, today_local};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_PER_PAGE: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_profile))
        .route("/api/food-logs", get(get_food_logs).post(log_food))
        .route("/api/food-logs/{id}", delete(delete_food_log))
        .route("/api/parse-food", post(parse_food))
        .route("/api/workouts", post(log_workout))
        .route("/api/cardio-sessions", post(log_cardio))
        .route("/api/weight-logs", post(log_weight))
        .route("/api/streaks/{domain}", get(get_streak))
        .route("/api/streaks/{domain}/recompute", post(recompute_streak))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/energy/targets", get(get_energy_targets))
        .route("/api/progress/weight", get(get_weight_progress))
        .route("/api/account", delete(delete_account))
}

/// The calendar day a log counts toward: the client's local date when the
/// request carries one, otherwise the server's local date.
fn effective_date(local_date: Option<NaiveDate>) -> NaiveDate {
    local_date.unwrap_or_else(today_local)
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile))
}

/// Profile update payload. Every field is optional; present fields replace
/// the stored value.
#[derive(Deserialize, Validate)]
struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    display_name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    sex: Option<Sex>,
    #[validate(range(min = 13, max = 120))]
    age: Option<u32>,
    #[validate(range(min = 100.0, max = 250.0))]
    height_cm: Option<f64>,
    #[validate(range(min = 20.0, max = 300.0))]
    weight_kg: Option<f64>,
    activity_level: Option<ActivityLevel>,
    weight_goal: Option<WeightGoal>,
    #[validate(range(min = 20.0, max = 300.0))]
    start_weight_kg: Option<f64>,
    #[validate(range(min = 20.0, max = 300.0))]
    target_weight_kg: Option<f64>,
}

/// Create or update the current user's profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    payload.validate()?;

    let now = format_utc_rfc3339(chrono::Utc::now());

    // Fetch-modify-write to preserve fields the payload omits; profiles are
    // created lazily on first update.
    let mut profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| UserProfile {
            user_id: user.user_id.clone(),
            email: None,
            display_name: String::new(),
            sex: None,
            age: None,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            weight_goal: None,
            start_weight_kg: None,
            target_weight_kg: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        });

    if let Some(name) = payload.display_name {
        profile.display_name = name;
    }
    if let Some(email) = payload.email {
        profile.email = Some(email);
    }
    if let Some(sex) = payload.sex {
        profile.sex = Some(sex);
    }
    if let Some(age) = payload.age {
        profile.age = Some(age);
    }
    if let Some(height) = payload.height_cm {
        profile.height_cm = Some(height);
    }
    if let Some(weight) = payload.weight_kg {
        profile.weight_kg = Some(weight);
    }
    if let Some(level) = payload.activity_level {
        profile.activity_level = Some(level);
    }
    if let Some(goal) = payload.weight_goal {
        profile.weight_goal = Some(goal);
    }
    if let Some(start) = payload.start_weight_kg {
        profile.start_weight_kg = Some(start);
    }
    if let Some(target) = payload.target_weight_kg {
        profile.target_weight_kg = Some(target);
    }
    profile.updated_at = now;

    state.db.upsert_profile(&profile).await?;

    Ok(Json(profile))
}

// ─── Food Logs ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct LogFoodRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[validate(range(min = 0.0, max = 10000.0))]
    calories: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    protein_g: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    carbs_g: f64,
    #[validate(range(min = 0.0, max = 1000.0))]
    #[serde(default)]
    fat_g: f64,
    /// Client-local calendar date this log counts toward
    local_date: Option<NaiveDate>,
}

/// Response for log inserts that touch a streak.
#[derive(Serialize)]
struct LogResponse<T> {
    #[serde(flatten)]
    log: T,
    /// Streak after this log
    current_streak: u32,
    /// False when today was already counted
    streak_advanced: bool,
}

/// Log a food item and advance the food streak.
async fn log_food(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<LogFoodRequest>,
) -> Result<Json<LogResponse<FoodLog>>> {
    payload.validate()?;

    let log_date = effective_date(payload.local_date);
    let log = FoodLog {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        name: payload.name,
        calories: payload.calories,
        protein_g: payload.protein_g,
        carbs_g: payload.carbs_g,
        fat_g: payload.fat_g,
        log_date,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let (streak, advanced) = state.streaks.record_food_log(&log, log_date).await?;

    Ok(Json(LogResponse {
        log,
        current_streak: streak.current_streak,
        streak_advanced: advanced,
    }))
}

#[derive(Deserialize)]
struct FoodLogsQuery {
    /// Only logs counting toward this calendar date
    date: Option<NaiveDate>,
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    50
}

#[derive(Serialize)]
struct FoodLogsResponse {
    logs: Vec<FoodLog>,
    page: u32,
    per_page: u32,
}

/// List the current user's food logs, newest first.
async fn get_food_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FoodLogsQuery>,
) -> Result<Json<FoodLogsResponse>> {
    if query.page == 0 {
        return Err(AppError::BadRequest("page must be >= 1".to_string()));
    }
    let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
    let offset = (query.page - 1) * per_page;

    let logs = state
        .db
        .get_food_logs_for_user(&user.user_id, query.date, per_page, offset)
        .await?;

    Ok(Json(FoodLogsResponse {
        logs,
        page: query.page,
        per_page,
    }))
}

#[derive(Serialize)]
struct DeleteLogResponse {
    success: bool,
    /// Food streak after the correcting recompute
    current_streak: u32,
}

/// Delete a food log and recompute the food streak.
///
/// The incremental streak path cannot un-count a deleted day, so every
/// deletion is followed by a full recompute from history.
async fn delete_food_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
) -> Result<Json<DeleteLogResponse>> {
    let log = state
        .db
        .get_food_log(&log_id)
        .await?
        .filter(|l| l.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Food log {}", log_id)))?;

    state.db.delete_food_log(&log.id).await?;

    let today = today_local();
    let streak = state
        .streaks
        .recompute_from_history(&user.user_id, StreakDomain::Food, today)
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        log_id = %log.id,
        current_streak = streak.current_streak,
        "Food log deleted, streak recomputed"
    );

    Ok(Json(DeleteLogResponse {
        success: true,
        current_streak: streak.display_streak(StreakDomain::Food, today),
    }))
}

// ─── Food Text Parsing ───────────────────────────────────────

#[derive(Deserialize, Validate)]
struct ParseFoodRequest {
    #[validate(length(min = 1, max = 500))]
    text: String,
}

/// Parse a free-text meal description via the generative-language endpoint.
async fn parse_food(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ParseFoodRequest>,
) -> Result<Json<ParsedFood>> {
    payload.validate()?;

    let parsed = state.parser.parse_food_text(&payload.text).await?;
    Ok(Json(parsed))
}

// ─── Exercise Logs ───────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct LogWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[validate(range(min = 1.0, max = 1440.0))]
    duration_min: f64,
    local_date: Option<NaiveDate>,
}

/// Log a strength workout and advance the exercise streak.
async fn log_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<LogWorkoutRequest>,
) -> Result<Json<LogResponse<Workout>>> {
    payload.validate()?;

    let log_date = effective_date(payload.local_date);
    let workout = Workout {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        name: payload.name,
        duration_min: payload.duration_min,
        log_date,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let (streak, advanced) = state.streaks.record_workout(&workout, log_date).await?;

    Ok(Json(LogResponse {
        log: workout,
        current_streak: streak.current_streak,
        streak_advanced: advanced,
    }))
}

#[derive(Deserialize, Validate)]
struct LogCardioRequest {
    #[validate(length(min = 1, max = 100))]
    activity: String,
    #[validate(range(min = 1.0, max = 1440.0))]
    duration_min: f64,
    #[validate(range(min = 0.0, max = 10000.0))]
    #[serde(default)]
    calories_burned: f64,
    local_date: Option<NaiveDate>,
}

/// Log a cardio session and advance the exercise streak.
async fn log_cardio(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<LogCardioRequest>,
) -> Result<Json<LogResponse<CardioSession>>> {
    payload.validate()?;

    let log_date = effective_date(payload.local_date);
    let session = CardioSession {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        activity: payload.activity,
        duration_min: payload.duration_min,
        calories_burned: payload.calories_burned,
        log_date,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let (streak, advanced) = state.streaks.record_cardio(&session, log_date).await?;

    Ok(Json(LogResponse {
        log: session,
        current_streak: streak.current_streak,
        streak_advanced: advanced,
    }))
}

// ─── Weight Logs ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct LogWeightRequest {
    #[validate(range(min = 20.0, max = 300.0))]
    weight_kg: f64,
    local_date: Option<NaiveDate>,
}

/// Log a body-weight measurement and update the profile's current weight.
async fn log_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<LogWeightRequest>,
) -> Result<Json<WeightLog>> {
    payload.validate()?;

    let log = WeightLog {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        weight_kg: payload.weight_kg,
        log_date: effective_date(payload.local_date),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    state.db.set_weight_log(&log).await?;

    // Fetch-modify-write to keep the profile's current weight in sync.
    if let Some(mut profile) = state.db.get_profile(&user.user_id).await? {
        profile.weight_kg = Some(payload.weight_kg);
        profile.updated_at = format_utc_rfc3339(chrono::Utc::now());
        state.db.upsert_profile(&profile).await?;
    }

    Ok(Json(log))
}

// ─── Streaks ─────────────────────────────────────────────────

/// Streak state returned to clients.
#[derive(Serialize)]
struct StreakResponse {
    domain: StreakDomain,
    /// Display value: 0 once the grace window has passed
    current_streak: u32,
    max_streak: u32,
    recovery_allowance: u32,
    last_log_date: Option<NaiveDate>,
}

impl StreakResponse {
    fn from_record(domain: StreakDomain, record: &ActivityStreak, today: NaiveDate) -> Self {
        Self {
            domain,
            current_streak: record.display_streak(domain, today),
            max_streak: record.max_streak,
            recovery_allowance: record.recovery_allowance,
            last_log_date: record.last_log_date,
        }
    }
}

fn parse_domain(raw: &str) -> Result<StreakDomain> {
    raw.parse().map_err(AppError::BadRequest)
}

/// Get the current user's streak for a domain.
async fn get_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(domain): Path<String>,
) -> Result<Json<StreakResponse>> {
    let domain = parse_domain(&domain)?;
    let today = today_local();

    let record = state
        .streaks
        .streak_record(&user.user_id, domain, today)
        .await?;

    Ok(Json(StreakResponse::from_record(domain, &record, today)))
}

/// Force a streak recompute from the full log history.
async fn recompute_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(domain): Path<String>,
) -> Result<Json<StreakResponse>> {
    let domain = parse_domain(&domain)?;
    let today = today_local();

    let record = state
        .streaks
        .recompute_from_history(&user.user_id, domain, today)
        .await?;

    Ok(Json(StreakResponse::from_record(domain, &record, today)))
}

// ─── Dashboard ───────────────────────────────────────────────

/// Home-screen summary. Streaks come through the stale-while-revalidate
/// cache; the calorie target is absent until the profile is complete.
#[derive(Serialize)]
struct DashboardResponse {
    food_streak: u32,
    exercise_streak: u32,
    calories_today: f64,
    calorie_target: Option<f64>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let today = today_local();

    let food_streak = state
        .streaks
        .current_streak_cached(&user.user_id, StreakDomain::Food, today)
        .await?;
    let exercise_streak = state
        .streaks
        .current_streak_cached(&user.user_id, StreakDomain::Exercise, today)
        .await?;

    let todays_logs = state
        .db
        .get_food_logs_for_user(&user.user_id, Some(today), MAX_PER_PAGE, 0)
        .await?;
    let calories_today: f64 = todays_logs.iter().map(|l| l.calories).sum();

    let calorie_target = state
        .db
        .get_profile(&user.user_id)
        .await?
        .and_then(|p| energy::daily_targets(&p).ok())
        .map(|t| t.calorie_target);

    Ok(Json(DashboardResponse {
        food_streak,
        exercise_streak,
        calories_today,
        calorie_target,
    }))
}

// ─── Energy & Progress ───────────────────────────────────────

/// Daily energy and macro targets from the stored profile.
async fn get_energy_targets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<energy::EnergyTargets>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let targets =
        energy::daily_targets(&profile).map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(targets))
}

#[derive(Serialize)]
struct WeightProgressResponse {
    start_weight_kg: f64,
    current_weight_kg: f64,
    target_weight_kg: f64,
    /// None when start equals target
    percent: Option<f64>,
}

/// Progress toward the user's weight goal.
async fn get_weight_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WeightProgressResponse>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let (Some(start), Some(target)) = (profile.start_weight_kg, profile.target_weight_kg) else {
        return Err(AppError::BadRequest(
            "Weight goal not configured: set start and target weight".to_string(),
        ));
    };

    // Prefer the latest weigh-in; fall back to the profile's current weight.
    let current = match state.db.get_latest_weight(&user.user_id).await? {
        Some(log) => log.weight_kg,
        None => profile
            .weight_kg
            .ok_or_else(|| AppError::BadRequest("No weight recorded yet".to_string()))?,
    };

    Ok(Json(WeightProgressResponse {
        start_weight_kg: start,
        current_weight_kg: current,
        target_weight_kg: target,
        percent: energy::weight_progress_percent(start, current, target),
    }))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
struct DeleteAccountResponse {
    success: bool,
    message: String,
}

/// Delete the user's account and all associated data (GDPR compliance).
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    let deleted = state.db.delete_user_data(&user.user_id).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: format!("Account deleted ({} documents removed).", deleted),
    }))
}
