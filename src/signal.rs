//! Low-level signal conditioning for the motion pipeline.
//!
//! Two stages live here:
//! - [`VectorFilter`]: single-pole IIR low-pass that strips high-frequency
//!   vibration noise from the 3-axis acceleration stream while preserving
//!   driving dynamics.
//! - [`TemporalSmoother`]: time-windowed moving average applied to the risk
//!   signal so a single noisy sample cannot trigger feedback.
//!
//! Both stages run O(1)-ish per sample (the smoother holds ~25 entries at
//! 50 Hz over 500 ms) and never allocate in steady state beyond the window
//! deque. `reset()` fully clears internal history; a new session must start
//! from a clean baseline or stale filter state bleeds into the settling
//! period.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Vector3};

/// Parameters for the low-pass stage.
///
/// The alpha coefficient is always derived from these values, never
/// hardcoded: `alpha = dt / (rc + dt)` with `rc = 1 / (2π·cutoff_hz)` and
/// `dt = 1 / sample_rate_hz`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Cutoff frequency in Hz. 2 Hz keeps braking/steering dynamics and
    /// drops engine and road vibration.
    pub cutoff_hz: f32,
    /// Nominal sample rate of the accelerometer stream in Hz.
    pub sample_rate_hz: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 2.0,
            sample_rate_hz: 50.0,
        }
    }
}

impl FilterConfig {
    /// Derives the IIR coefficient from the configured cutoff and rate.
    pub fn alpha(&self) -> f32 {
        let dt = 1.0 / self.sample_rate_hz;
        let rc = 1.0 / (2.0 * std::f32::consts::PI * self.cutoff_hz);
        dt / (rc + dt)
    }

    /// Rejects non-positive cutoff or sample rate before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cutoff_hz > 0.0) {
            return Err(ConfigError::InvalidFilterParameter {
                name: "cutoff_hz",
                value: self.cutoff_hz,
            });
        }
        if !(self.sample_rate_hz > 0.0) {
            return Err(ConfigError::InvalidFilterParameter {
                name: "sample_rate_hz",
                value: self.sample_rate_hz,
            });
        }
        Ok(())
    }
}

/// Single-pole IIR low-pass filter over a 3-axis signal.
///
/// `output = alpha * input + (1 - alpha) * previous_output`, per axis.
/// The first sample after `reset()` passes through unchanged, which seeds
/// the filter state without introducing a zero-origin transient.
#[derive(Debug, Clone)]
pub struct VectorFilter {
    alpha: f32,
    previous: Option<Vector3>,
}

impl VectorFilter {
    /// Creates a filter with the coefficient derived from `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            alpha: config.alpha(),
            previous: None,
        }
    }

    /// Applies the filter to one sample and returns the smoothed value.
    pub fn apply(&mut self, current: Vector3) -> Vector3 {
        let Some(prev) = self.previous else {
            self.previous = Some(current);
            return current;
        };

        let filtered = Vector3::new(
            self.alpha * current.x + (1.0 - self.alpha) * prev.x,
            self.alpha * current.y + (1.0 - self.alpha) * prev.y,
            self.alpha * current.z + (1.0 - self.alpha) * prev.z,
        );
        self.previous = Some(filtered);
        filtered
    }

    /// Clears filter state. The next sample passes through unfiltered.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// The derived IIR coefficient, exposed for diagnostics.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// Time-windowed moving average over a scalar signal.
///
/// Holds `(value, timestamp_ms)` pairs; each `add()` appends the new sample,
/// evicts entries older than the window, and returns the mean of what
/// remains. Suppresses single-sample spikes in the risk signal so feedback
/// reacts to sustained roughness, not sensor glitches.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window_ms: f64,
    samples: VecDeque<(f32, f64)>,
}

impl TemporalSmoother {
    /// Creates a smoother with the given window in milliseconds.
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            // ~25 entries at 50 Hz over the default 500 ms window
            samples: VecDeque::with_capacity(32),
        }
    }

    /// Adds a sample and returns the windowed average.
    pub fn add(&mut self, value: f32, timestamp_ms: f64) -> f32 {
        self.samples.push_back((value, timestamp_ms));

        let cutoff = timestamp_ms - self.window_ms;
        while let Some(&(_, ts)) = self.samples.front() {
            if ts < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        let sum: f32 = self.samples.iter().map(|&(v, _)| v).sum();
        sum / self.samples.len() as f32
    }

    /// Number of samples currently inside the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window duration in milliseconds.
    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Clears the window. The next `add()` starts a fresh average.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
