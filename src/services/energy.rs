// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Energy and body-metric arithmetic.
//!
//! One shared module for the formulas the app's screens all need: BMR
//! (Mifflin-St Jeor), TDEE via activity factors, goal-adjusted calorie and
//! macro targets, and weight-goal progress. Incomplete profiles are an
//! explicit error here: callers decide what to show, nothing is silently
//! defaulted.

use crate::models::profile::{ActivityLevel, Sex, UserProfile, WeightGoal};
use serde::Serialize;

// Mifflin-St Jeor coefficients (1990).
const BMR_WEIGHT_COEFF: f64 = 10.0;
const BMR_HEIGHT_COEFF: f64 = 6.25;
const BMR_AGE_COEFF: f64 = 5.0;
const BMR_MALE_OFFSET: f64 = 5.0;
const BMR_FEMALE_OFFSET: f64 = -161.0;

// Accepted input ranges.
const WEIGHT_RANGE_KG: (f64, f64) = (20.0, 300.0);
const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);
const AGE_RANGE: (u32, u32) = (13, 120);

// kcal per gram of macronutrient.
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Daily energy and macro targets computed from a complete profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnergyTargets {
    /// Basal Metabolic Rate in kcal/day
    pub bmr: f64,
    /// Total Daily Energy Expenditure in kcal/day
    pub tdee: f64,
    /// Goal-adjusted daily calorie target in kcal/day
    pub calorie_target: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Errors from energy calculations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EnergyError {
    #[error("Profile is missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

impl WeightGoal {
    /// Daily calorie adjustment applied to TDEE.
    fn calorie_adjustment(self) -> f64 {
        match self {
            WeightGoal::Lose => -500.0,
            WeightGoal::Maintain => 0.0,
            WeightGoal::Gain => 300.0,
        }
    }

    /// Macro split as (protein, carbs, fat) fractions of the calorie target.
    fn macro_split(self) -> (f64, f64, f64) {
        match self {
            WeightGoal::Lose => (0.30, 0.40, 0.30),
            WeightGoal::Maintain => (0.25, 0.45, 0.30),
            WeightGoal::Gain => (0.25, 0.50, 0.25),
        }
    }
}

/// Basal Metabolic Rate via Mifflin-St Jeor:
/// `10*weight_kg + 6.25*height_cm - 5*age + offset` (+5 male, -161 female).
pub fn bmr_mifflin_st_jeor(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    sex: Sex,
) -> Result<f64, EnergyError> {
    if !(WEIGHT_RANGE_KG.0..=WEIGHT_RANGE_KG.1).contains(&weight_kg) {
        return Err(EnergyError::OutOfRange {
            field: "weight_kg",
            value: weight_kg,
        });
    }
    if !(HEIGHT_RANGE_CM.0..=HEIGHT_RANGE_CM.1).contains(&height_cm) {
        return Err(EnergyError::OutOfRange {
            field: "height_cm",
            value: height_cm,
        });
    }
    if !(AGE_RANGE.0..=AGE_RANGE.1).contains(&age) {
        return Err(EnergyError::OutOfRange {
            field: "age",
            value: f64::from(age),
        });
    }

    let offset = match sex {
        Sex::Male => BMR_MALE_OFFSET,
        Sex::Female => BMR_FEMALE_OFFSET,
    };

    Ok(BMR_WEIGHT_COEFF * weight_kg + BMR_HEIGHT_COEFF * height_cm
        - BMR_AGE_COEFF * f64::from(age)
        + offset)
}

/// Total Daily Energy Expenditure: BMR scaled by the activity factor.
pub fn tdee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * level.factor()
}

/// Compute daily targets from a profile.
///
/// Every body metric must be present; a missing field is reported by name
/// so the client can prompt for it.
pub fn daily_targets(profile: &UserProfile) -> Result<EnergyTargets, EnergyError> {
    let weight_kg = profile
        .weight_kg
        .ok_or(EnergyError::MissingField("weight_kg"))?;
    let height_cm = profile
        .height_cm
        .ok_or(EnergyError::MissingField("height_cm"))?;
    let age = profile.age.ok_or(EnergyError::MissingField("age"))?;
    let sex = profile.sex.ok_or(EnergyError::MissingField("sex"))?;
    let level = profile
        .activity_level
        .ok_or(EnergyError::MissingField("activity_level"))?;
    let goal = profile
        .weight_goal
        .ok_or(EnergyError::MissingField("weight_goal"))?;

    let bmr = bmr_mifflin_st_jeor(weight_kg, height_cm, age, sex)?;
    let tdee = tdee(bmr, level);
    let calorie_target = tdee + goal.calorie_adjustment();

    let (protein_frac, carbs_frac, fat_frac) = goal.macro_split();

    Ok(EnergyTargets {
        bmr,
        tdee,
        calorie_target,
        protein_g: calorie_target * protein_frac / KCAL_PER_G_PROTEIN,
        carbs_g: calorie_target * carbs_frac / KCAL_PER_G_CARBS,
        fat_g: calorie_target * fat_frac / KCAL_PER_G_FAT,
    })
}

/// Progress toward a weight goal as a percentage, clamped to `[0, 100]`.
///
/// Works for both loss (start > target) and gain (start < target); returns
/// `None` when start equals target, where the formula is undefined.
pub fn weight_progress_percent(
    start_kg: f64,
    current_kg: f64,
    target_kg: f64,
) -> Option<f64> {
    let total = start_kg - target_kg;
    if total == 0.0 {
        return None;
    }
    let progressed = start_kg - current_kg;
    Some((progressed / total * 100.0).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> UserProfile {
        UserProfile {
            user_id: "user-1".to_string(),
            email: None,
            display_name: "Test".to_string(),
            sex: Some(Sex::Male),
            age: Some(25),
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            activity_level: Some(ActivityLevel::Sedentary),
            weight_goal: Some(WeightGoal::Maintain),
            start_weight_kg: Some(75.0),
            target_weight_kg: Some(65.0),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_bmr_known_values() {
        // 10*70 + 6.25*175 - 5*25 + 5 = 1673.75
        let male = bmr_mifflin_st_jeor(70.0, 175.0, 25, Sex::Male).unwrap();
        assert!((male - 1673.75).abs() < 1e-9);

        // Same inputs, female offset: 1673.75 - 166 = 1507.75
        let female = bmr_mifflin_st_jeor(70.0, 175.0, 25, Sex::Female).unwrap();
        assert!((female - 1507.75).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_rejects_out_of_range() {
        assert_eq!(
            bmr_mifflin_st_jeor(10.0, 175.0, 25, Sex::Male),
            Err(EnergyError::OutOfRange {
                field: "weight_kg",
                value: 10.0
            })
        );
        assert!(bmr_mifflin_st_jeor(70.0, 90.0, 25, Sex::Male).is_err());
        assert!(bmr_mifflin_st_jeor(70.0, 175.0, 12, Sex::Male).is_err());
    }

    #[test]
    fn test_tdee_applies_activity_factor() {
        assert!((tdee(1673.75, ActivityLevel::Sedentary) - 2008.5).abs() < 1e-9);
        assert!((tdee(1000.0, ActivityLevel::ExtraActive) - 1900.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_targets_complete_profile() {
        let targets = daily_targets(&complete_profile()).unwrap();

        assert!((targets.bmr - 1673.75).abs() < 1e-9);
        assert!((targets.tdee - 2008.5).abs() < 1e-9);
        assert!((targets.calorie_target - 2008.5).abs() < 1e-9);

        // Macro grams convert back to the calorie target.
        let kcal = targets.protein_g * 4.0 + targets.carbs_g * 4.0 + targets.fat_g * 9.0;
        assert!((kcal - targets.calorie_target).abs() < 1e-6);
    }

    #[test]
    fn test_daily_targets_goal_adjustment() {
        let mut profile = complete_profile();
        profile.weight_goal = Some(WeightGoal::Lose);

        let targets = daily_targets(&profile).unwrap();
        assert!((targets.calorie_target - (2008.5 - 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_daily_targets_reports_missing_field_by_name() {
        let mut profile = complete_profile();
        profile.weight_kg = None;
        assert_eq!(
            daily_targets(&profile),
            Err(EnergyError::MissingField("weight_kg"))
        );

        let mut profile = complete_profile();
        profile.activity_level = None;
        assert_eq!(
            daily_targets(&profile),
            Err(EnergyError::MissingField("activity_level"))
        );
    }

    #[test]
    fn test_weight_progress_loss() {
        // 75 -> 70 toward 65: halfway.
        let pct = weight_progress_percent(75.0, 70.0, 65.0).unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_progress_gain() {
        let pct = weight_progress_percent(60.0, 63.0, 70.0).unwrap();
        assert!((pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_progress_clamps() {
        // Regressed past the start: clamps to 0.
        assert_eq!(weight_progress_percent(75.0, 80.0, 65.0), Some(0.0));
        // Overshot the target: clamps to 100.
        assert_eq!(weight_progress_percent(75.0, 60.0, 65.0), Some(100.0));
    }

    #[test]
    fn test_weight_progress_undefined_without_delta() {
        assert_eq!(weight_progress_percent(70.0, 70.0, 70.0), None);
    }
}
