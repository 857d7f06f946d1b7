// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Activity logs (food logs, workouts, cardio sessions, weight logs)
//! - Streak records (per user, per domain)
//!
//! Streak updates run inside Firestore transactions so that a log write and
//! its streak-record update succeed or fail together, and concurrent
//! submissions cannot double-increment a streak.

use crate::db::collections;
use crate::error::AppError;
use crate::models::streak::{ActivityStreak, StreakDomain};
use crate::models::{CardioSession, FoodLog, UserProfile, WeightLog, Workout};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Profile Operations ─────────────────────────────────

    /// Get a user profile by identity-provider user id.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Food Log Operations ─────────────────────────────────────

    /// Get a food log by ID.
    pub async fn get_food_log(&self, log_id: &str) -> Result<Option<FoodLog>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FOOD_LOGS)
            .obj()
            .one(log_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get food logs for a user with pagination, newest first.
    ///
    /// When `on_date` is set, only logs counting toward that calendar day
    /// are returned.
    pub async fn get_food_logs_for_user(
        &self,
        user_id: &str,
        on_date: Option<NaiveDate>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<FoodLog>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOD_LOGS);

        let user_id = user_id.to_string();
        let query = if let Some(date) = on_date {
            let date = date.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("log_date").eq(date.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id.clone()))
        };

        query
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a food log document.
    ///
    /// The caller must follow up with a streak recompute: the incremental
    /// streak path only moves forward in time and cannot un-count a
    /// deleted day.
    pub async fn delete_food_log(&self, log_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FOOD_LOGS)
            .document_id(log_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Weight Log Operations ───────────────────────────────────

    /// Store a body-weight measurement.
    pub async fn set_weight_log(&self, log: &WeightLog) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WEIGHT_LOGS)
            .document_id(&log.id)
            .object(log)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent body-weight measurement for a user, if any.
    pub async fn get_latest_weight(&self, user_id: &str) -> Result<Option<WeightLog>, AppError> {
        let user_id = user_id.to_string();
        let logs: Vec<WeightLog> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WEIGHT_LOGS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("log_date", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(logs.into_iter().next())
    }

    // ─── Streak Record Operations ────────────────────────────────

    /// Document id for a streak record.
    fn streak_doc_id(user_id: &str, domain: StreakDomain) -> String {
        format!("{}_{}", user_id, domain)
    }

    /// Get the streak record for a user and domain.
    pub async fn get_streak(
        &self,
        user_id: &str,
        domain: StreakDomain,
    ) -> Result<Option<ActivityStreak>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STREAKS)
            .obj()
            .one(&Self::streak_doc_id(user_id, domain))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the streak record for a user and domain.
    pub async fn set_streak(
        &self,
        user_id: &str,
        domain: StreakDomain,
        streak: &ActivityStreak,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STREAKS)
            .document_id(Self::streak_doc_id(user_id, domain))
            .object(streak)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Qualifying Date Queries ─────────────────────────────────

    /// Distinct calendar dates on which the user performed a qualifying
    /// action for the domain (food log insert; workout or cardio-session
    /// insert).
    pub async fn list_qualifying_dates(
        &self,
        user_id: &str,
        domain: StreakDomain,
    ) -> Result<BTreeSet<NaiveDate>, AppError> {
        match domain {
            StreakDomain::Food => {
                let logs: Vec<FoodLog> = self.query_logs(collections::FOOD_LOGS, user_id).await?;
                Ok(logs.into_iter().map(|l| l.log_date).collect())
            }
            StreakDomain::Exercise => {
                // Workouts and cardio sessions both qualify; fetch them
                // concurrently.
                let (workouts, cardio) = futures_util::try_join!(
                    self.query_logs::<Workout>(collections::WORKOUTS, user_id),
                    self.query_logs::<CardioSession>(collections::CARDIO_SESSIONS, user_id),
                )?;

                Ok(workouts
                    .into_iter()
                    .map(|w| w.log_date)
                    .chain(cardio.into_iter().map(|c| c.log_date))
                    .collect())
            }
        }
    }

    /// Whether a qualifying log exists for the given calendar date.
    pub async fn has_activity_on(
        &self,
        user_id: &str,
        domain: StreakDomain,
        date: NaiveDate,
    ) -> Result<bool, AppError> {
        match domain {
            StreakDomain::Food => self.collection_has_on(collections::FOOD_LOGS, user_id, date).await,
            StreakDomain::Exercise => {
                if self
                    .collection_has_on(collections::WORKOUTS, user_id, date)
                    .await?
                {
                    return Ok(true);
                }
                self.collection_has_on(collections::CARDIO_SESSIONS, user_id, date)
                    .await
            }
        }
    }

    /// Query all log documents in a collection belonging to a user.
    async fn query_logs<T>(&self, collection: &str, user_id: &str) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check for at least one document with the given log date.
    async fn collection_has_on(
        &self,
        collection: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let date = date.to_string();
        let docs: Vec<serde_json::Value> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("log_date").eq(date.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!docs.is_empty())
    }

    // ─── Atomic Log Recording ────────────────────────────────────

    /// Atomically store a qualifying log and advance the streak record.
    ///
    /// This method uses a Firestore transaction to ensure both writes
    /// succeed or fail together. If another request modifies the streak
    /// record concurrently, Firestore will retry the transaction with fresh
    /// data, preventing a lost update (rapid double-submission cannot
    /// double-increment the streak).
    ///
    /// Returns the streak record after the write, and `true` if the streak
    /// advanced (`false` when today was already counted; the log document
    /// is still written, since several meals or sessions per day are
    /// expected).
    pub async fn record_log_atomic<T: Serialize + Send + Sync + for<'de> serde::Deserialize<'de>>(
        &self,
        user_id: &str,
        domain: StreakDomain,
        collection: &str,
        doc_id: &str,
        doc: &T,
        today: NaiveDate,
    ) -> Result<(ActivityStreak, bool), AppError> {
        // Safety check: ensure the user still exists before writing.
        // This mitigates "zombie data" if account deletion happened during
        // processing.
        if self.get_profile(user_id).await?.is_none() {
            tracing::warn!(user_id, %domain, "User not found, aborting atomic log write");
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        // Begin a transaction
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the current streak record within the transaction.
        //    This registers the document for conflict detection.
        let current: Option<ActivityStreak> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STREAKS)
            .obj()
            .one(&Self::streak_doc_id(user_id, domain))
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read streak in transaction: {}", e))
            })?;

        let mut streak = current.unwrap_or_else(|| ActivityStreak::new(domain));

        // 2. Advance in memory (same-day logs leave the streak unchanged)
        let advanced = streak.advance(domain, today);

        // 3. Add the log write to the transaction
        self.get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add log to transaction: {}", e)))?;

        // 4. Add the streak write if it changed
        if advanced {
            streak.updated_at = chrono::Utc::now().to_rfc3339();

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::STREAKS)
                .document_id(Self::streak_doc_id(user_id, domain))
                .object(&streak)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add streak to transaction: {}", e))
                })?;
        }

        // 5. Commit the transaction atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        if advanced {
            tracing::info!(
                user_id,
                %domain,
                current_streak = streak.current_streak,
                "Log recorded, streak advanced"
            );
        } else {
            tracing::debug!(user_id, %domain, "Log recorded, day already counted");
        }

        Ok((streak, advanced))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Data Deletion (GDPR) ─────────────────────────────────

    /// Delete ALL data for a user (GDPR compliance).
    ///
    /// Deletes from all collections:
    /// - `food_logs`, `workouts`, `cardio_sessions`, `weight_logs`
    ///   (query by user_id)
    /// - `streaks/{user_id}_{domain}` for both domains
    /// - `users/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Delete all log documents
        let food_logs: Vec<FoodLog> = self.query_logs(collections::FOOD_LOGS, user_id).await?;
        deleted_count += food_logs.len();
        self.batch_delete(&food_logs, collections::FOOD_LOGS, |l: &FoodLog| {
            l.id.clone()
        })
        .await?;

        let workouts: Vec<Workout> = self.query_logs(collections::WORKOUTS, user_id).await?;
        deleted_count += workouts.len();
        self.batch_delete(&workouts, collections::WORKOUTS, |w: &Workout| w.id.clone())
            .await?;

        let cardio: Vec<CardioSession> =
            self.query_logs(collections::CARDIO_SESSIONS, user_id).await?;
        deleted_count += cardio.len();
        self.batch_delete(&cardio, collections::CARDIO_SESSIONS, |c: &CardioSession| {
            c.id.clone()
        })
        .await?;

        let weights: Vec<WeightLog> = self.query_logs(collections::WEIGHT_LOGS, user_id).await?;
        deleted_count += weights.len();
        self.batch_delete(&weights, collections::WEIGHT_LOGS, |w: &WeightLog| {
            w.id.clone()
        })
        .await?;

        tracing::debug!(user_id, count = deleted_count, "Deleted log documents");

        // 2. Delete streak records for both domains
        for domain in [StreakDomain::Food, StreakDomain::Exercise] {
            self.get_client()?
                .fluent()
                .delete()
                .from(collections::STREAKS)
                .document_id(Self::streak_doc_id(user_id, domain))
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted_count += 1;
        }
        tracing::debug!(user_id, "Deleted streak records");

        // 3. Delete user profile
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;
        tracing::debug!(user_id, "Deleted user profile");

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
