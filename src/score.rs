//! Post-drive smoothness scoring.
//!
//! A pure reduction of the session's spill log and duration into a 0–100
//! score, revealed once at drive end. Identical inputs always produce the
//! identical result including the itemized breakdown; the UI renders it
//! and the tests assert on it.
//!
//! Formula: base 100, minus a severity-bucketed penalty per spill, plus
//! 1 point per 5 minutes of driving (capped at +10), plus a flat +5 for a
//! spill-free drive, clamped to [0, 100].

use serde::{Deserialize, Serialize};

/// Base score before penalties and bonuses.
const BASE_SCORE: i32 = 100;

/// Penalty for a spill under severity 0.5.
const PENALTY_LOW: i32 = 5;
/// Penalty for a spill with severity in [0.5, 0.7).
const PENALTY_MEDIUM: i32 = 10;
/// Penalty for a spill with severity ≥ 0.7.
const PENALTY_HIGH: i32 = 15;

/// One bonus point per this much drive time.
const DURATION_BONUS_INTERVAL_MS: u64 = 5 * 60 * 1000;
/// Duration bonus cap.
const MAX_DURATION_BONUS: i32 = 10;
/// Flat bonus for a drive with zero spills.
const PERFECT_BONUS: i32 = 5;

/// A logged spill, as consumed by scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpillEvent {
    /// Smoothed risk at the moment the spill fired. `None` for legacy
    /// records without one; treated as the lowest bucket.
    pub severity: Option<f32>,
}

impl SpillEvent {
    pub fn new(severity: f32) -> Self {
        Self {
            severity: Some(severity),
        }
    }

    /// Penalty points for this spill.
    fn penalty(&self) -> i32 {
        let severity = self.severity.unwrap_or(0.0);
        if severity >= 0.7 {
            PENALTY_HIGH
        } else if severity >= 0.5 {
            PENALTY_MEDIUM
        } else {
            PENALTY_LOW
        }
    }
}

/// Itemized components of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_score: i32,
    pub spill_penalty: i32,
    pub duration_bonus: i32,
    pub perfect_bonus: i32,
}

/// Final drive score with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Smoothness score, always within [0, 100].
    pub score: u8,
    /// True when the drive had zero spills.
    pub is_perfect: bool,
    pub breakdown: ScoreBreakdown,
}

/// Computes the score for a completed drive.
///
/// Deterministic and side-effect free; the raw total is clamped so that
/// no penalty pile-up drives the score negative and no bonus stack pushes
/// it past 100.
pub fn calculate_score(spill_events: &[SpillEvent], duration_ms: u64) -> ScoreResult {
    let spill_penalty: i32 = spill_events.iter().map(SpillEvent::penalty).sum();

    let duration_bonus =
        ((duration_ms / DURATION_BONUS_INTERVAL_MS) as i32).min(MAX_DURATION_BONUS);

    let is_perfect = spill_events.is_empty();
    let perfect_bonus = if is_perfect { PERFECT_BONUS } else { 0 };

    let raw = BASE_SCORE - spill_penalty + duration_bonus + perfect_bonus;
    let score = raw.clamp(0, 100) as u8;

    ScoreResult {
        score,
        is_perfect,
        breakdown: ScoreBreakdown {
            base_score: BASE_SCORE,
            spill_penalty,
            duration_bonus,
            perfect_bonus,
        },
    }
}
