//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FOOD_LOGS: &str = "food_logs";
    pub const WORKOUTS: &str = "workouts";
    pub const CARDIO_SESSIONS: &str = "cardio_sessions";
    pub const WEIGHT_LOGS: &str = "weight_logs";
    /// Streak records (keyed by `{user_id}_{domain}`)
    pub const STREAKS: &str = "streaks";
}
