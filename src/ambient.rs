//! Continuous ambient volume control.
//!
//! An overlay for the advanced mode: a looping tension bed whose volume
//! tracks risk. The modulator owns two values, where the volume is and
//! where it should be, and walks one toward the other by a fixed step per
//! interpolation tick (~30 Hz), so level changes ramp instead of clicking.
//!
//! A spill breaks the pattern deliberately: both values drop to zero at
//! once (shock silence), and only after a delay matching the spill
//! cooldown does the target return to the calm baseline for the ramp to
//! rebuild toward. Tension build-up, shock, gradual recovery, not a
//! volume slider.

use serde::{Deserialize, Serialize};

/// Tunables for the ambient controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Calm baseline volume: audible but unobtrusive.
    pub min_volume: f32,
    /// Maximum tension volume: leaves headroom for the spill sound.
    pub max_volume: f32,
    /// Volume change per interpolation tick. 0.03 at ~30 Hz gives a full
    /// sweep in about a second.
    pub ramp_step: f32,
    /// Silence duration after a spill before the rebuild begins (ms).
    /// Matches the spill cooldown.
    pub rebuild_delay_ms: f64,
    /// Risk value treated as full tension; risk is normalized against
    /// this ceiling before mapping to volume.
    pub risk_ceiling: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            min_volume: 0.15,
            max_volume: 0.7,
            ramp_step: 0.03,
            rebuild_delay_ms: 2_500.0,
            risk_ceiling: 0.9,
        }
    }
}

/// Risk-driven volume interpolation controller.
///
/// Clock-free: `tick()` takes the caller's timestamp, which also schedules
/// the post-spill rebuild.
#[derive(Debug, Clone)]
pub struct AmbientModulator {
    config: AmbientConfig,
    current_volume: f32,
    target_volume: f32,
    rebuild_at_ms: Option<f64>,
}

impl AmbientModulator {
    pub fn new(config: AmbientConfig) -> Self {
        Self {
            config,
            current_volume: 0.0,
            target_volume: config.min_volume,
            rebuild_at_ms: None,
        }
    }

    /// Snaps both values to the calm baseline, as playback starts.
    pub fn start(&mut self) {
        self.current_volume = self.config.min_volume;
        self.target_volume = self.config.min_volume;
        self.rebuild_at_ms = None;
    }

    /// Maps risk onto the target volume.
    ///
    /// Risk 0 is the calm baseline; risk at or above the ceiling is full
    /// tension; linear in between. The ramp does the actual moving.
    pub fn set_risk_level(&mut self, risk: f32) {
        // Ignore risk while the post-spill silence is pending; the rebuild
        // owns the target until it fires.
        if self.rebuild_at_ms.is_some() {
            return;
        }
        let risk = if risk.is_finite() { risk.max(0.0) } else { 0.0 };
        let normalized = (risk / self.config.risk_ceiling).min(1.0);
        self.target_volume = self.config.min_volume
            + normalized * (self.config.max_volume - self.config.min_volume);
    }

    /// Handles a spill: instant silence, rebuild scheduled.
    pub fn on_spill(&mut self, now_ms: f64) {
        self.current_volume = 0.0;
        self.target_volume = 0.0;
        self.rebuild_at_ms = Some(now_ms + self.config.rebuild_delay_ms);
    }

    /// One interpolation tick. Returns the volume the playback layer
    /// should apply.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        if let Some(rebuild_at) = self.rebuild_at_ms {
            if now_ms >= rebuild_at {
                self.rebuild_at_ms = None;
                self.target_volume = self.config.min_volume;
            }
        }

        let diff = self.target_volume - self.current_volume;
        // Dead-band skips micro-adjustments.
        if diff.abs() >= 0.01 {
            let step = diff.abs().min(self.config.ramp_step);
            self.current_volume += step.copysign(diff);
        }
        self.current_volume
    }

    /// Current applied volume.
    pub fn volume(&self) -> f32 {
        self.current_volume
    }

    /// Volume the ramp is heading toward.
    pub fn target_volume(&self) -> f32 {
        self.target_volume
    }

    /// Drops to silence and clears timers for session teardown.
    pub fn reset(&mut self) {
        self.current_volume = 0.0;
        self.target_volume = self.config.min_volume;
        self.rebuild_at_ms = None;
    }
}

impl Default for AmbientModulator {
    fn default() -> Self {
        Self::new(AmbientConfig::default())
    }
}
