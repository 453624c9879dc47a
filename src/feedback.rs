//! Risk-zone feedback arbitration.
//!
//! Maps the smoothed risk stream onto discrete sounds using
//! threshold-crossing detection: a sound fires when the risk *enters* a new
//! zone, never continuously while sitting in one. Two rate limits sit on
//! top:
//!
//! - a global 300 ms minimum between any two sounds;
//! - a spill-specific 2.5 s cooldown plus a recovery requirement: after a
//!   spill, the driver must bring risk back under the light threshold
//!   before another spill can fire. Staying pinned above the spill
//!   threshold re-triggers nothing.
//!
//! A spill blocked by cooldown/recovery falls back to the heavy slosh
//! sound (unless the arbiter is already in the heavy zone, which would
//! double it).

use serde::{Deserialize, Serialize};

use crate::types::FeedbackSound;

/// Risk value at which the light zone begins. Dropping back under this
/// value is also what completes spill recovery.
pub const LIGHT_THRESHOLD: f32 = 0.3;
/// Risk value at which the medium zone begins.
pub const MEDIUM_THRESHOLD: f32 = 0.5;
/// Risk value at which the heavy zone begins.
pub const HEAVY_THRESHOLD: f32 = 0.7;
/// Smoothed risk floor for the spill zone; the raw spill flag is also
/// required.
pub const SPILL_THRESHOLD: f32 = 0.9;

/// Rate-limiting parameters for the arbiter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Spill cooldown duration in milliseconds.
    pub spill_cooldown_ms: f64,
    /// Minimum interval between any two sounds in milliseconds.
    pub min_sound_interval_ms: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            spill_cooldown_ms: 2_500.0,
            min_sound_interval_ms: 300.0,
        }
    }
}

/// Discretized risk bucket, ordered from calm to catastrophic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskZone {
    Silent,
    Light,
    Medium,
    Heavy,
    Spill,
}

impl RiskZone {
    /// Derives the zone from smoothed risk and the raw spill flag.
    ///
    /// Priority order matters: spill requires both the flag and a high
    /// smoothed risk, so one noisy sample cannot fake a spill on its own.
    pub fn from_risk(risk: f32, is_spill: bool) -> RiskZone {
        if is_spill && risk >= SPILL_THRESHOLD {
            RiskZone::Spill
        } else if risk >= HEAVY_THRESHOLD {
            RiskZone::Heavy
        } else if risk >= MEDIUM_THRESHOLD {
            RiskZone::Medium
        } else if risk >= LIGHT_THRESHOLD {
            RiskZone::Light
        } else {
            RiskZone::Silent
        }
    }

    /// The sound this zone selects on entry, if any.
    pub fn sound(&self) -> Option<FeedbackSound> {
        match self {
            RiskZone::Silent => None,
            RiskZone::Light => Some(FeedbackSound::SloshLight),
            RiskZone::Medium => Some(FeedbackSound::SloshMedium),
            RiskZone::Heavy => Some(FeedbackSound::SloshHeavy),
            RiskZone::Spill => Some(FeedbackSound::Spill),
        }
    }
}

/// Spill cooldown + recovery tracking.
///
/// Invariant: `requires_recovery` cannot clear while `in_cooldown` is
/// true. Recovery completes only once the cooldown has elapsed *and* risk
/// has dipped under the light threshold.
#[derive(Debug, Clone, Default)]
struct SpillCooldown {
    in_cooldown: bool,
    requires_recovery: bool,
    ends_at_ms: f64,
}

impl SpillCooldown {
    fn can_trigger(&self) -> bool {
        !self.in_cooldown && !self.requires_recovery
    }

    fn start(&mut self, now_ms: f64, duration_ms: f64) {
        self.in_cooldown = true;
        self.requires_recovery = true;
        self.ends_at_ms = now_ms + duration_ms;
    }

    /// Advances the timer. Returns true on the tick the cooldown expires.
    fn tick(&mut self, now_ms: f64) -> bool {
        if self.in_cooldown && now_ms >= self.ends_at_ms {
            self.in_cooldown = false;
            return true;
        }
        false
    }

    fn signal_recovery(&mut self) {
        if !self.in_cooldown {
            self.requires_recovery = false;
        }
    }

    fn reset(&mut self) {
        *self = SpillCooldown::default();
    }
}

/// Selects which discrete sound, if any, the current tick fires.
///
/// Timer-bearing but clock-free: every `evaluate()` takes the caller's
/// timestamp, so tests drive time synthetically.
#[derive(Debug, Clone)]
pub struct FeedbackArbiter {
    config: FeedbackConfig,
    cooldown: SpillCooldown,
    current_zone: RiskZone,
    last_trigger_ms: Option<f64>,
    last_sound: Option<FeedbackSound>,
}

impl FeedbackArbiter {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            cooldown: SpillCooldown::default(),
            current_zone: RiskZone::Silent,
            last_trigger_ms: None,
            last_sound: None,
        }
    }

    /// Evaluates one tick of smoothed risk.
    ///
    /// Returns the sound to fire, or `None` for silence. Call once per
    /// pipeline tick while a drive is active.
    pub fn evaluate(&mut self, risk: f32, is_spill: bool, now_ms: f64) -> Option<FeedbackSound> {
        // Cooldown expiry clears zone memory so the same zone can fire
        // again after the enforced quiet.
        if self.cooldown.tick(now_ms) {
            self.current_zone = RiskZone::Silent;
        }

        // Risk dipping under the light threshold completes recovery
        // (never during the cooldown itself).
        if risk < LIGHT_THRESHOLD {
            self.cooldown.signal_recovery();
        }

        let new_zone = RiskZone::from_risk(risk, is_spill);

        if new_zone == RiskZone::Silent {
            self.current_zone = RiskZone::Silent;
            return None;
        }
        if new_zone == self.current_zone {
            return None;
        }
        if let Some(last) = self.last_trigger_ms {
            if now_ms - last < self.config.min_sound_interval_ms {
                return None;
            }
        }

        if new_zone == RiskZone::Spill {
            if self.cooldown.can_trigger() {
                self.cooldown.start(now_ms, self.config.spill_cooldown_ms);
                return Some(self.fire(RiskZone::Spill, now_ms));
            }
            // Blocked spill degrades to heavy, unless that would double.
            if self.current_zone == RiskZone::Heavy {
                return None;
            }
            return Some(self.fire(RiskZone::Heavy, now_ms));
        }

        new_zone.sound().map(|_| self.fire(new_zone, now_ms))
    }

    fn fire(&mut self, zone: RiskZone, now_ms: f64) -> FeedbackSound {
        // Every firing zone carries a sound; Silent never reaches here.
        let sound = zone.sound().unwrap_or(FeedbackSound::SloshLight);
        self.current_zone = zone;
        self.last_trigger_ms = Some(now_ms);
        self.last_sound = Some(sound);
        sound
    }

    /// True while a spill cannot fire (cooldown running or recovery
    /// pending).
    pub fn is_spill_blocked(&self) -> bool {
        !self.cooldown.can_trigger()
    }

    /// True while the 2.5 s cooldown window itself is running.
    pub fn is_in_cooldown(&self) -> bool {
        self.cooldown.in_cooldown
    }

    /// Zone the arbiter currently considers active (for UI display).
    pub fn current_zone(&self) -> RiskZone {
        self.current_zone
    }

    /// Most recently fired sound (for debugging).
    pub fn last_sound(&self) -> Option<FeedbackSound> {
        self.last_sound
    }

    /// Clears zone memory, cooldown, and timers for a new session.
    pub fn reset(&mut self) {
        self.cooldown.reset();
        self.current_zone = RiskZone::Silent;
        self.last_trigger_ms = None;
        self.last_sound = None;
    }
}

impl Default for FeedbackArbiter {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}
