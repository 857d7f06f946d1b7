// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak tracking service.
//!
//! Handles the core workflow around the streak records:
//! 1. Record qualifying logs (food, workout, cardio) atomically with the
//!    streak update
//! 2. Answer display queries with lazy expiry and a stale-while-revalidate
//!    cache
//! 3. Recompute a streak from the full log history after deletions or when
//!    a stored record is corrupt

use crate::db::{collections, FirestoreDb};
use crate::error::Result;
use crate::models::streak::{ActivityStreak, StreakDomain};
use crate::models::{CardioSession, FoodLog, Workout};
use crate::services::cache::SwrCache;
use chrono::NaiveDate;
use std::sync::Arc;

/// Shared display cache type for use in AppState.
pub type StreakDisplayCache = Arc<SwrCache<(String, StreakDomain), u32>>;

/// Service owning streak reads, writes, and recomputation.
///
/// The backend record is authoritative; the display cache only smooths
/// dashboard reads and is invalidated on every mutation.
#[derive(Clone)]
pub struct StreakService {
    db: FirestoreDb,
    display_cache: StreakDisplayCache,
}

impl StreakService {
    /// Create a new streak service with a shared display cache.
    pub fn new(db: FirestoreDb, display_cache: StreakDisplayCache) -> Self {
        Self { db, display_cache }
    }

    // ─── Recording ───────────────────────────────────────────────

    /// Record a food log and advance the food streak.
    ///
    /// Returns the streak record after the write and whether it advanced
    /// (a second log on the same day records the food but not the day).
    pub async fn record_food_log(
        &self,
        log: &FoodLog,
        today: NaiveDate,
    ) -> Result<(ActivityStreak, bool)> {
        let result = self
            .db
            .record_log_atomic(
                &log.user_id,
                StreakDomain::Food,
                collections::FOOD_LOGS,
                &log.id,
                log,
                today,
            )
            .await?;

        self.display_cache
            .invalidate(&(log.user_id.clone(), StreakDomain::Food));
        Ok(result)
    }

    /// Record a workout and advance the exercise streak.
    pub async fn record_workout(
        &self,
        workout: &Workout,
        today: NaiveDate,
    ) -> Result<(ActivityStreak, bool)> {
        let result = self
            .db
            .record_log_atomic(
                &workout.user_id,
                StreakDomain::Exercise,
                collections::WORKOUTS,
                &workout.id,
                workout,
                today,
            )
            .await?;

        self.display_cache
            .invalidate(&(workout.user_id.clone(), StreakDomain::Exercise));
        Ok(result)
    }

    /// Record a cardio session and advance the exercise streak.
    pub async fn record_cardio(
        &self,
        session: &CardioSession,
        today: NaiveDate,
    ) -> Result<(ActivityStreak, bool)> {
        let result = self
            .db
            .record_log_atomic(
                &session.user_id,
                StreakDomain::Exercise,
                collections::CARDIO_SESSIONS,
                &session.id,
                session,
                today,
            )
            .await?;

        self.display_cache
            .invalidate(&(session.user_id.clone(), StreakDomain::Exercise));
        Ok(result)
    }

    // ─── Queries ─────────────────────────────────────────────────

    /// Load the streak record, reconciled for display.
    ///
    /// - No record or no logs yet: zero-state.
    /// - Corrupt stored values: recompute from history instead of trusting
    ///   them.
    /// - Exercise record claiming "today": verify a qualifying log really
    ///   exists today (the record can say today after a log that was since
    ///   deleted) and recompute if it does not.
    pub async fn streak_record(
        &self,
        user_id: &str,
        domain: StreakDomain,
        today: NaiveDate,
    ) -> Result<ActivityStreak> {
        let Some(record) = self.db.get_streak(user_id, domain).await? else {
            return Ok(ActivityStreak::new(domain));
        };

        if let Err(err) = record.validate(today) {
            tracing::warn!(
                user_id,
                %domain,
                error = %err,
                "Corrupt streak record, recomputing from history"
            );
            return self.recompute_from_history(user_id, domain, today).await;
        }

        if domain == StreakDomain::Exercise && record.last_log_date == Some(today) {
            let verified = self.db.has_activity_on(user_id, domain, today).await?;
            if !verified {
                tracing::warn!(
                    user_id,
                    %domain,
                    "Streak record claims today without a backing log, recomputing"
                );
                return self.recompute_from_history(user_id, domain, today).await;
            }
        }

        Ok(record)
    }

    /// Current streak for display: 0 once the grace window has passed,
    /// without mutating the stored record.
    pub async fn current_streak(
        &self,
        user_id: &str,
        domain: StreakDomain,
        today: NaiveDate,
    ) -> Result<u32> {
        let record = self.streak_record(user_id, domain, today).await?;
        Ok(record.display_streak(domain, today))
    }

    /// Cached display streak: fresh cache hits are served directly; stale
    /// hits are served immediately while a background refresh runs; misses
    /// compute inline.
    pub async fn current_streak_cached(
        &self,
        user_id: &str,
        domain: StreakDomain,
        today: NaiveDate,
    ) -> Result<u32> {
        let key = (user_id.to_string(), domain);

        if let Some(cached) = self.display_cache.get(&key) {
            if cached.is_fresh {
                return Ok(cached.value);
            }

            // Serve stale, revalidate in the background.
            let service = self.clone();
            let user_id = user_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = service.refresh_display(&user_id, domain, today).await {
                    tracing::warn!(
                        user_id = %user_id,
                        %domain,
                        error = %err,
                        "Background streak refresh failed"
                    );
                }
            });
            return Ok(cached.value);
        }

        self.refresh_display(user_id, domain, today).await
    }

    /// Compute the display streak and refresh the cache entry.
    async fn refresh_display(
        &self,
        user_id: &str,
        domain: StreakDomain,
        today: NaiveDate,
    ) -> Result<u32> {
        let value = self.current_streak(user_id, domain, today).await?;
        self.display_cache
            .insert((user_id.to_string(), domain), value);
        Ok(value)
    }

    // ─── Recomputation ───────────────────────────────────────────

    /// Rebuild the streak record from the complete qualifying-date history.
    ///
    /// The authoritative correction path: must run after any retroactive
    /// log deletion.
    pub async fn recompute_from_history(
        &self,
        user_id: &str,
        domain: StreakDomain,
        today: NaiveDate,
    ) -> Result<ActivityStreak> {
        let dates = self.db.list_qualifying_dates(user_id, domain).await?;

        let prior_max = self
            .db
            .get_streak(user_id, domain)
            .await?
            .map_or(0, |r| r.max_streak);

        let mut record = ActivityStreak::replay(domain, &dates, prior_max, today);
        record.updated_at = chrono::Utc::now().to_rfc3339();

        self.db.set_streak(user_id, domain, &record).await?;
        self.display_cache
            .invalidate(&(user_id.to_string(), domain));

        tracing::info!(
            user_id,
            %domain,
            current_streak = record.current_streak,
            history_days = dates.len(),
            "Streak recomputed from history"
        );

        Ok(record)
    }
}
