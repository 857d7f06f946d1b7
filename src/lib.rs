// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Kcal-Tracker: backend for a calorie & fitness tracking app
//!
//! This crate provides the backend API for logging meals and exercise,
//! tracking daily streaks with gap tolerance, and computing energy targets.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{FoodParserClient, StreakService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub streaks: StreakService,
    pub parser: FoodParserClient,
}
