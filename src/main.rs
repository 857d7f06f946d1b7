// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kcal-Tracker API Server
//!
//! Backend for a calorie & fitness tracking app: meal and exercise logging,
//! daily streaks with gap tolerance, and energy target calculations.

use kcal_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{cache::SwrCache, FoodParserClient, StreakService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Kcal-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize the streak service with its display cache.
    // The cache lifecycle (TTL, invalidation) is owned here, not hidden in
    // module-level globals.
    let display_cache = Arc::new(SwrCache::new(chrono::Duration::seconds(
        config.streak_cache_ttl_secs,
    )));
    let streaks = StreakService::new(db.clone(), display_cache);
    tracing::info!(
        ttl_secs = config.streak_cache_ttl_secs,
        "Streak display cache initialized"
    );

    // Initialize the food-text parser client
    let parser = FoodParserClient::new(config.genai_api_key.clone(), config.genai_model.clone());
    tracing::info!(model = %config.genai_model, "Food parser client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        streaks,
        parser,
    });

    // Build router
    let app = kcal_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kcal_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
