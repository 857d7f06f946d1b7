//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// Biological sex, used by the BMR formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Self-reported weekly activity level for TDEE calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied to BMR.
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }
}

/// Weight goal, shifts the daily calorie target off TDEE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightGoal {
    Lose,
    Maintain,
    Gain,
}

/// User profile stored in Firestore.
///
/// Body metrics are optional: the app can onboard a user before they fill
/// them in. Energy calculations require a complete set and fail loudly on
/// missing fields instead of substituting defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity-provider user id (also used as document ID)
    pub user_id: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Display name
    pub display_name: String,
    pub sex: Option<Sex>,
    /// Age in years
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    /// Current body weight in kilograms
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub weight_goal: Option<WeightGoal>,
    /// Weight when the user set their goal
    pub start_weight_kg: Option<f64>,
    /// Goal weight
    pub target_weight_kg: Option<f64>,
    /// When the user signed up
    pub created_at: String,
    /// Last profile update timestamp
    pub updated_at: String,
}
