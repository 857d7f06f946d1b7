// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cache;
pub mod energy;
pub mod food_parser;
pub mod streak;

pub use cache::{Cached, SwrCache};
pub use food_parser::{FoodParserClient, ParsedFood};
pub use streak::{StreakDisplayCache, StreakService};
