//! Jerk-to-risk normalization with difficulty-dependent thresholds.
//!
//! Maps the combined jerk magnitude onto a bounded [0, 1] risk value:
//! below the slosh threshold the cup is steady and risk is zero; at or
//! above the spill threshold the cup has tipped and the sample is flagged
//! as a spill; in between, risk interpolates linearly so the feedback
//! layer can grade its response.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::ConfigError;

/// Difficulty level selecting how forgiving the thresholds are.
///
/// Changing difficulty takes effect on the next `normalize()` call; there
/// is no per-session lock-in at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    /// Forgiving baseline for a first drive.
    #[default]
    Easy,
    /// Moderate challenge.
    Experienced,
    /// Strict thresholds for experts.
    Master,
}

impl DifficultyLevel {
    /// Threshold pair for this level.
    pub fn thresholds(&self) -> DifficultyThresholds {
        match self {
            DifficultyLevel::Easy => DifficultyThresholds { slosh: 5.0, spill: 10.0 },
            DifficultyLevel::Experienced => DifficultyThresholds { slosh: 3.0, spill: 7.0 },
            DifficultyLevel::Master => DifficultyThresholds { slosh: 1.5, spill: 4.0 },
        }
    }

    /// Stable name used in settings and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Experienced => "experienced",
            DifficultyLevel::Master => "master",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = ConfigError;

    /// Parses a difficulty name. Unknown names are rejected here, at the
    /// configuration boundary, never at evaluation time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(DifficultyLevel::Easy),
            "experienced" => Ok(DifficultyLevel::Experienced),
            "master" => Ok(DifficultyLevel::Master),
            other => Err(ConfigError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Jerk thresholds (m/s³) for one difficulty level.
///
/// Grounded in ride-comfort literature: ~1 m/s³ is the comfort optimum and
/// ~10 m/s³ the tolerable maximum, so Easy spans most of that range while
/// Master pinches it down hard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    /// Jerk magnitude where slosh feedback begins.
    pub slosh: f32,
    /// Jerk magnitude where the cup spills.
    pub spill: f32,
}

/// Instantaneous risk for one sample, before temporal smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskReading {
    /// Normalized risk in [0, 1].
    pub risk: f32,
    /// True when the raw jerk reached the spill threshold.
    pub is_spill: bool,
}

/// Normalizes jerk magnitude to risk under the current difficulty.
#[derive(Debug, Clone, Default)]
pub struct RiskNormalizer {
    difficulty: DifficultyLevel,
}

impl RiskNormalizer {
    pub fn new(difficulty: DifficultyLevel) -> Self {
        Self { difficulty }
    }

    /// Switches difficulty; applies from the next `normalize()` call.
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        self.difficulty = difficulty;
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    /// Maps a jerk magnitude to `RiskReading`.
    ///
    /// Non-finite input reads as zero jerk, a neutral sample, not an
    /// error. Output risk is always in [0, 1].
    pub fn normalize(&self, jerk_magnitude: f32) -> RiskReading {
        if !jerk_magnitude.is_finite() {
            return RiskReading::default();
        }

        let DifficultyThresholds { slosh, spill } = self.difficulty.thresholds();

        if jerk_magnitude < slosh {
            return RiskReading { risk: 0.0, is_spill: false };
        }
        if jerk_magnitude >= spill {
            return RiskReading { risk: 1.0, is_spill: true };
        }

        let risk = ((jerk_magnitude - slosh) / (spill - slosh)).clamp(0.0, 1.0);
        RiskReading { risk, is_spill: false }
    }
}
