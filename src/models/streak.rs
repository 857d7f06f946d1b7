// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day activity streaks with gap tolerance.
//!
//! Each user has one streak record per domain (food logging, exercise).
//! A short gap can be absorbed by a recovery allowance instead of breaking
//! the streak; the two domains use deliberately different break policies
//! (food hard-resets, exercise keeps half the streak). Do not unify them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Activity domain a streak counts. Each domain has its own tolerance
/// parameters and its own stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakDomain {
    /// Food logging streak ("freeze" allowance, starts at 3).
    Food,
    /// Exercise streak (rolling gap-day "buffer", starts at 2).
    Exercise,
}

impl StreakDomain {
    /// Allowance a fresh record starts with.
    pub fn starting_allowance(self) -> u32 {
        match self {
            StreakDomain::Food => 3,
            StreakDomain::Exercise => 2,
        }
    }

    /// Days since the last log beyond which the streak reads as 0.
    ///
    /// Food uses a flat two-day window; exercise scales with the
    /// remaining buffer.
    pub fn grace_days(self, allowance: u32) -> i64 {
        match self {
            StreakDomain::Food => 2,
            StreakDomain::Exercise => i64::from(allowance) + 1,
        }
    }

    /// Stable identifier used in document ids and API paths.
    pub fn as_str(self) -> &'static str {
        match self {
            StreakDomain::Food => "food",
            StreakDomain::Exercise => "exercise",
        }
    }
}

impl std::fmt::Display for StreakDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreakDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(StreakDomain::Food),
            "exercise" => Ok(StreakDomain::Exercise),
            other => Err(format!("Unknown streak domain: {}", other)),
        }
    }
}

/// Stored streak record, one per `(user, domain)`.
///
/// Stored in the `streaks` collection, document id `{user_id}_{domain}`.
/// The stored `current_streak` may be stale after a long gap; callers must
/// go through [`ActivityStreak::display_streak`], which applies the grace
/// window without mutating the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStreak {
    /// Consecutive qualifying days as of the last recompute.
    pub current_streak: u32,
    /// High-water mark, never decreases.
    pub max_streak: u32,
    /// Calendar date of the most recent qualifying log ("YYYY-MM-DD"),
    /// absent until the first log.
    pub last_log_date: Option<NaiveDate>,
    /// Remaining gap tolerance (freezes for food, buffer days for exercise).
    pub recovery_allowance: u32,
    /// Last update timestamp (ISO 8601).
    #[serde(default)]
    pub updated_at: String,
}

/// Impossible stored values that indicate a corrupt record.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreakRecordError {
    #[error("current_streak {current} exceeds max_streak {max}")]
    CurrentExceedsMax { current: u32, max: u32 },

    #[error("last_log_date {0} is in the future")]
    FutureLogDate(NaiveDate),

    #[error("current_streak {0} is nonzero without a last_log_date")]
    StreakWithoutLogDate(u32),
}

impl ActivityStreak {
    /// Zero-state record for a user who has never logged in this domain.
    pub fn new(domain: StreakDomain) -> Self {
        Self {
            current_streak: 0,
            max_streak: 0,
            last_log_date: None,
            recovery_allowance: domain.starting_allowance(),
            updated_at: String::new(),
        }
    }

    /// Count a qualifying log for `today`.
    ///
    /// Returns `false` (record unchanged) when today was already counted,
    /// so logging twice on the same calendar day is a no-op for the streak.
    pub fn advance(&mut self, domain: StreakDomain, today: NaiveDate) -> bool {
        match self.last_log_date {
            None => {
                // First ever qualifying log.
                self.current_streak = 1;
            }
            Some(last) if last >= today => {
                return false;
            }
            Some(last) => {
                let gap = (today - last).num_days();
                if gap == 1 {
                    self.current_streak += 1;
                    if domain == StreakDomain::Exercise {
                        // Consecutive-day logging restores the full buffer.
                        self.recovery_allowance = domain.starting_allowance();
                    }
                } else {
                    self.absorb_or_break(domain, gap);
                }
            }
        }

        self.max_streak = self.max_streak.max(self.current_streak);
        self.last_log_date = Some(today);
        true
    }

    /// Handle a multi-day gap: consume allowance if the gap is tolerable,
    /// otherwise break the streak per the domain's policy.
    fn absorb_or_break(&mut self, domain: StreakDomain, gap: i64) {
        match domain {
            StreakDomain::Food => {
                if (2..=3).contains(&gap) && self.recovery_allowance > 0 {
                    self.recovery_allowance -= 1;
                    self.current_streak += 1;
                } else {
                    // Hard reset: today starts a new streak of 1.
                    self.current_streak = 1;
                }
            }
            StreakDomain::Exercise => {
                if gap <= i64::from(self.recovery_allowance) + 1 {
                    let consumed = (gap - 1) as u32;
                    self.recovery_allowance = self.recovery_allowance.saturating_sub(consumed);
                    self.current_streak += 1;
                } else {
                    // Recovery bonus: keep half the streak, floor 1.
                    self.current_streak = (self.current_streak / 2).max(1);
                }
            }
        }
    }

    /// Streak value to show callers.
    ///
    /// Once the grace window has passed the streak reads as 0, but the
    /// stored fields are left stale until the next write or recompute.
    pub fn display_streak(&self, domain: StreakDomain, today: NaiveDate) -> u32 {
        let Some(last) = self.last_log_date else {
            return 0;
        };
        let days_since = (today - last).num_days();
        if days_since > domain.grace_days(self.recovery_allowance) {
            0
        } else {
            self.current_streak
        }
    }

    /// Check stored values against the record invariants.
    pub fn validate(&self, today: NaiveDate) -> Result<(), StreakRecordError> {
        if self.current_streak > self.max_streak {
            return Err(StreakRecordError::CurrentExceedsMax {
                current: self.current_streak,
                max: self.max_streak,
            });
        }
        if let Some(last) = self.last_log_date {
            if last > today {
                return Err(StreakRecordError::FutureLogDate(last));
            }
        } else if self.current_streak != 0 {
            return Err(StreakRecordError::StreakWithoutLogDate(self.current_streak));
        }
        Ok(())
    }

    /// Rebuild the record from the complete set of qualifying dates.
    ///
    /// This is the authoritative correction path after retroactive log
    /// deletion; the incremental `advance` path only moves forward in time
    /// and cannot un-count a deleted day.
    ///
    /// The replay walks backwards from the most recent date. A one-day gap
    /// continues the run; a tolerable gap consumes allowance (food: flat
    /// pool of 3 across the whole replay; exercise: fixed buffer of 2,
    /// not decremented); anything larger stops the walk.
    pub fn replay(
        domain: StreakDomain,
        dates: &BTreeSet<NaiveDate>,
        prior_max: u32,
        today: NaiveDate,
    ) -> Self {
        let Some(&most_recent) = dates.iter().next_back() else {
            return Self {
                max_streak: prior_max,
                ..Self::new(domain)
            };
        };

        let starting = domain.starting_allowance();

        if (today - most_recent).num_days() > domain.grace_days(starting) {
            // Expired: streak reads 0 but the last log date is kept for
            // reference.
            return Self {
                current_streak: 0,
                max_streak: prior_max,
                last_log_date: Some(most_recent),
                recovery_allowance: starting,
                updated_at: String::new(),
            };
        }

        let mut run = 1u32;
        let mut food_pool = starting;
        let mut prev = most_recent;

        for &date in dates.iter().rev().skip(1) {
            let gap = (prev - date).num_days();
            let continues = match domain {
                _ if gap == 1 => true,
                StreakDomain::Food => {
                    if (2..=3).contains(&gap) && food_pool > 0 {
                        food_pool -= 1;
                        true
                    } else {
                        false
                    }
                }
                StreakDomain::Exercise => gap <= i64::from(starting) + 1,
            };

            if !continues {
                break;
            }
            run += 1;
            prev = date;
        }

        let recovery_allowance = match domain {
            StreakDomain::Food => food_pool,
            StreakDomain::Exercise => starting,
        };

        Self {
            current_streak: run,
            max_streak: prior_max.max(run),
            last_log_date: Some(most_recent),
            recovery_allowance,
            updated_at: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(days: &[(i32, u32, u32)]) -> BTreeSet<NaiveDate> {
        days.iter().map(|&(y, m, d)| date(y, m, d)).collect()
    }

    #[test]
    fn test_first_log_starts_streak() {
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        assert!(streak.advance(StreakDomain::Food, date(2024, 1, 1)));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.max_streak, 1);
        assert_eq!(streak.last_log_date, Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        let before = streak.clone();

        assert!(!streak.advance(StreakDomain::Food, date(2024, 1, 1)));
        assert_eq!(streak, before);
    }

    #[test]
    fn test_consecutive_days_increment() {
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        streak.advance(StreakDomain::Food, date(2024, 1, 2));
        streak.advance(StreakDomain::Food, date(2024, 1, 3));

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.max_streak, 3);
        assert_eq!(streak.recovery_allowance, 3); // untouched by clean runs
    }

    #[test]
    fn test_food_gap_consumes_freeze() {
        // {Jan 1, Jan 4}: 3-day gap, within tolerance with freezes left.
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        streak.advance(StreakDomain::Food, date(2024, 1, 4));

        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.recovery_allowance, 2);
    }

    #[test]
    fn test_food_gap_without_freezes_breaks() {
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.recovery_allowance = 0;
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        streak.advance(StreakDomain::Food, date(2024, 1, 3));

        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_food_long_gap_hard_reset() {
        // {Jan 1, Jan 10}: 9-day gap exceeds tolerance regardless of freezes.
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        streak.advance(StreakDomain::Food, date(2024, 1, 10));

        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.max_streak, 1);
        assert_eq!(streak.recovery_allowance, 3); // break does not spend freezes
    }

    #[test]
    fn test_exercise_gap_consumes_buffer() {
        let mut streak = ActivityStreak::new(StreakDomain::Exercise);
        streak.advance(StreakDomain::Exercise, date(2024, 1, 1));
        // 3-day gap: tolerated (buffer 2 + 1), consumes gap-1 = 2 buffer days.
        streak.advance(StreakDomain::Exercise, date(2024, 1, 4));

        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.recovery_allowance, 0);
    }

    #[test]
    fn test_exercise_consecutive_day_restores_buffer() {
        let mut streak = ActivityStreak::new(StreakDomain::Exercise);
        streak.advance(StreakDomain::Exercise, date(2024, 1, 1));
        streak.advance(StreakDomain::Exercise, date(2024, 1, 4)); // buffer -> 0
        streak.advance(StreakDomain::Exercise, date(2024, 1, 5));

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.recovery_allowance, 2);
    }

    #[test]
    fn test_exercise_break_keeps_half() {
        // Recovery bonus: a broken 10-day streak restarts at 5, not 1.
        let mut streak = ActivityStreak {
            current_streak: 10,
            max_streak: 10,
            last_log_date: Some(date(2024, 1, 10)),
            recovery_allowance: 2,
            updated_at: String::new(),
        };
        streak.advance(StreakDomain::Exercise, date(2024, 1, 15)); // 5-day gap

        assert_eq!(streak.current_streak, 5);
        assert_eq!(streak.max_streak, 10);
    }

    #[test]
    fn test_exercise_break_floors_at_one() {
        let mut streak = ActivityStreak {
            current_streak: 1,
            max_streak: 1,
            last_log_date: Some(date(2024, 1, 1)),
            recovery_allowance: 2,
            updated_at: String::new(),
        };
        streak.advance(StreakDomain::Exercise, date(2024, 2, 1));

        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_max_streak_is_monotonic() {
        let mut streak = ActivityStreak::new(StreakDomain::Food);
        streak.advance(StreakDomain::Food, date(2024, 1, 1));
        streak.advance(StreakDomain::Food, date(2024, 1, 2));
        streak.advance(StreakDomain::Food, date(2024, 1, 3));
        assert_eq!(streak.max_streak, 3);

        // Break the streak; max must not go down.
        streak.advance(StreakDomain::Food, date(2024, 2, 1));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.max_streak, 3);
    }

    #[test]
    fn test_display_streak_expires_without_mutation() {
        let streak = ActivityStreak {
            current_streak: 7,
            max_streak: 7,
            last_log_date: Some(date(2024, 1, 1)),
            recovery_allowance: 3,
            updated_at: String::new(),
        };

        // Within the 2-day food grace window.
        assert_eq!(streak.display_streak(StreakDomain::Food, date(2024, 1, 3)), 7);
        // Past it: reads 0, stored value untouched.
        assert_eq!(streak.display_streak(StreakDomain::Food, date(2024, 1, 4)), 0);
        assert_eq!(streak.current_streak, 7);
    }

    #[test]
    fn test_display_streak_exercise_grace_scales_with_buffer() {
        let mut streak = ActivityStreak {
            current_streak: 4,
            max_streak: 4,
            last_log_date: Some(date(2024, 1, 1)),
            recovery_allowance: 2,
            updated_at: String::new(),
        };

        assert_eq!(
            streak.display_streak(StreakDomain::Exercise, date(2024, 1, 4)),
            4
        );
        assert_eq!(
            streak.display_streak(StreakDomain::Exercise, date(2024, 1, 5)),
            0
        );

        // A drained buffer shrinks the window.
        streak.recovery_allowance = 0;
        assert_eq!(
            streak.display_streak(StreakDomain::Exercise, date(2024, 1, 3)),
            0
        );
    }

    #[test]
    fn test_display_streak_never_logged() {
        let streak = ActivityStreak::new(StreakDomain::Exercise);
        assert_eq!(
            streak.display_streak(StreakDomain::Exercise, date(2024, 1, 1)),
            0
        );
    }

    #[test]
    fn test_validate_detects_corruption() {
        let today = date(2024, 6, 1);

        let mut streak = ActivityStreak::new(StreakDomain::Food);
        assert!(streak.validate(today).is_ok());

        streak.current_streak = 5;
        assert_eq!(
            streak.validate(today),
            Err(StreakRecordError::StreakWithoutLogDate(5))
        );

        streak.last_log_date = Some(date(2024, 5, 30));
        assert_eq!(
            streak.validate(today),
            Err(StreakRecordError::CurrentExceedsMax { current: 5, max: 0 })
        );

        streak.max_streak = 5;
        assert!(streak.validate(today).is_ok());

        streak.last_log_date = Some(date(2024, 6, 2));
        assert_eq!(
            streak.validate(today),
            Err(StreakRecordError::FutureLogDate(date(2024, 6, 2)))
        );
    }

    #[test]
    fn test_replay_empty_history_is_zero_state() {
        let streak = ActivityStreak::replay(
            StreakDomain::Food,
            &BTreeSet::new(),
            4,
            date(2024, 1, 1),
        );
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.max_streak, 4);
        assert_eq!(streak.last_log_date, None);
        assert_eq!(streak.recovery_allowance, 3);
    }

    #[test]
    fn test_replay_unbroken_run() {
        // {Jan 1, Jan 2, Jan 3}, today = Jan 3.
        let history = dates(&[(2024, 1, 1), (2024, 1, 2), (2024, 1, 3)]);
        let streak = ActivityStreak::replay(StreakDomain::Food, &history, 0, date(2024, 1, 3));

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.max_streak, 3);
        assert_eq!(streak.last_log_date, Some(date(2024, 1, 3)));
    }

    #[test]
    fn test_replay_after_deletion_correction() {
        // {Jan 1..5} minus Jan 4, today = Jan 5: the 2-day gap to Jan 3
        // consumes one freeze and the run continues. 4, not 5.
        let history = dates(&[(2024, 1, 1), (2024, 1, 2), (2024, 1, 3), (2024, 1, 5)]);
        let streak = ActivityStreak::replay(StreakDomain::Food, &history, 5, date(2024, 1, 5));

        assert_eq!(streak.current_streak, 4);
        assert_eq!(streak.max_streak, 5);
        assert_eq!(streak.recovery_allowance, 2);
    }

    #[test]
    fn test_replay_food_pool_is_bounded() {
        // Four 2-day gaps need four freezes; only three exist, so the walk
        // stops at the fourth.
        let history = dates(&[
            (2024, 1, 1),
            (2024, 1, 3),
            (2024, 1, 5),
            (2024, 1, 7),
            (2024, 1, 9),
        ]);
        let streak = ActivityStreak::replay(StreakDomain::Food, &history, 0, date(2024, 1, 9));

        assert_eq!(streak.current_streak, 4);
        assert_eq!(streak.recovery_allowance, 0);
    }

    #[test]
    fn test_replay_exercise_buffer_not_decremented() {
        // Repeated 3-day gaps all pass the fixed buffer+1 tolerance.
        let history = dates(&[(2024, 1, 1), (2024, 1, 4), (2024, 1, 7), (2024, 1, 10)]);
        let streak =
            ActivityStreak::replay(StreakDomain::Exercise, &history, 0, date(2024, 1, 10));

        assert_eq!(streak.current_streak, 4);
        assert_eq!(streak.recovery_allowance, 2);
    }

    #[test]
    fn test_replay_expired_history() {
        let history = dates(&[(2024, 1, 1), (2024, 1, 2)]);
        let streak = ActivityStreak::replay(StreakDomain::Food, &history, 2, date(2024, 2, 1));

        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.last_log_date, Some(date(2024, 1, 2)));
        assert_eq!(streak.recovery_allowance, 3);
        assert_eq!(streak.max_streak, 2);
    }

    #[test]
    fn test_replay_stops_at_large_gap() {
        let history = dates(&[(2024, 1, 1), (2024, 1, 20), (2024, 1, 21)]);
        let streak = ActivityStreak::replay(StreakDomain::Food, &history, 0, date(2024, 1, 21));

        assert_eq!(streak.current_streak, 2);
    }

    #[test]
    fn test_replay_matches_incremental_for_clean_runs() {
        // For gap-free histories the replay and the incremental path agree.
        let days: Vec<NaiveDate> = (1..=14).map(|d| date(2024, 3, d)).collect();

        let mut incremental = ActivityStreak::new(StreakDomain::Exercise);
        for &d in &days {
            incremental.advance(StreakDomain::Exercise, d);
        }

        let history: BTreeSet<NaiveDate> = days.iter().copied().collect();
        let replayed =
            ActivityStreak::replay(StreakDomain::Exercise, &history, 0, date(2024, 3, 14));

        assert_eq!(replayed.current_streak, incremental.current_streak);
        assert_eq!(replayed.current_streak, 14);
    }

    #[test]
    fn test_domain_parse_roundtrip() {
        assert_eq!("food".parse::<StreakDomain>().unwrap(), StreakDomain::Food);
        assert_eq!(
            "exercise".parse::<StreakDomain>().unwrap(),
            StreakDomain::Exercise
        );
        assert!("steps".parse::<StreakDomain>().is_err());
    }
}
