//! Jerk estimation: the rate of change of acceleration.
//!
//! Jerk (m/s³) is the core roughness signal: hard braking, harsh steering,
//! and aggressive throttle all show up as large jerk before they show up
//! anywhere else. The estimator differentiates the filtered acceleration
//! stream using the *actual* elapsed time between samples; real hardware
//! does not deliver a clean 20 ms cadence and assuming one skews the
//! magnitude by whatever the scheduler did that tick.

use crate::types::Vector3;

/// Per-axis jerk with the combined magnitude.
///
/// The magnitude is the RMS of x and y only. The vertical axis reflects
/// road texture, not driving inputs, so it is reported per-axis for the
/// surface detector but excluded from the roughness magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JerkSample {
    /// Lateral jerk (cornering) in m/s³.
    pub x: f32,
    /// Longitudinal jerk (accel/brake) in m/s³.
    pub y: f32,
    /// Vertical jerk (road surface) in m/s³.
    pub z: f32,
    /// RMS of x and y in m/s³.
    pub magnitude: f32,
}

impl JerkSample {
    pub const ZERO: JerkSample = JerkSample {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        magnitude: 0.0,
    };
}

/// Differentiates successive `(Vector3, timestamp)` pairs into jerk.
///
/// First call after `reset()` seeds internal state and returns zero jerk.
/// A non-positive or non-finite Δt (duplicate events, clock adjustments)
/// returns zero jerk *without* touching stored state, so one bad timestamp
/// cannot poison the next valid computation.
#[derive(Debug, Clone, Default)]
pub struct JerkEstimator {
    previous: Option<(Vector3, f64)>,
}

impl JerkEstimator {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Computes jerk from the current filtered acceleration and timestamp
    /// (seconds).
    pub fn compute(&mut self, accel: Vector3, timestamp_s: f64) -> JerkSample {
        let Some((prev_accel, prev_ts)) = self.previous else {
            self.previous = Some((accel, timestamp_s));
            return JerkSample::ZERO;
        };

        let dt = (timestamp_s - prev_ts) as f32;
        if !(dt > 0.0) || !dt.is_finite() {
            return JerkSample::ZERO;
        }

        let x = (accel.x - prev_accel.x) / dt;
        let y = (accel.y - prev_accel.y) / dt;
        let z = (accel.z - prev_accel.z) / dt;
        self.previous = Some((accel, timestamp_s));

        JerkSample {
            x,
            y,
            z,
            magnitude: (x * x + y * y).sqrt(),
        }
    }

    /// Clears state; the next `compute()` returns zero and reseeds.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_returns_zero() {
        let mut estimator = JerkEstimator::new();
        let jerk = estimator.compute(Vector3::new(1.0, 2.0, 3.0), 0.0);
        assert_eq!(jerk, JerkSample::ZERO);
    }

    #[test]
    fn test_jerk_uses_actual_delta_time() {
        let mut estimator = JerkEstimator::new();
        estimator.compute(Vector3::ZERO, 0.0);

        // 2 m/s² change over 0.04 s (a dropped sample) = 50 m/s³, not the
        // 100 m/s³ a fixed 20 ms assumption would produce.
        let jerk = estimator.compute(Vector3::new(2.0, 0.0, 0.0), 0.04);
        assert!((jerk.x - 50.0).abs() < 1e-3);
        assert!((jerk.magnitude - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_magnitude_excludes_vertical_axis() {
        let mut estimator = JerkEstimator::new();
        estimator.compute(Vector3::ZERO, 0.0);

        let jerk = estimator.compute(Vector3::new(0.3, 0.4, 100.0), 0.02);
        // magnitude = sqrt((0.3/0.02)² + (0.4/0.02)²) = sqrt(15² + 20²) = 25
        assert!((jerk.magnitude - 25.0).abs() < 1e-3);
        assert!(jerk.z > 0.0, "z is still reported per-axis");
    }

    #[test]
    fn test_non_positive_dt_returns_zero_without_state_update() {
        let mut estimator = JerkEstimator::new();
        estimator.compute(Vector3::new(1.0, 0.0, 0.0), 1.0);

        // Duplicate timestamp: zero jerk, state untouched.
        assert_eq!(estimator.compute(Vector3::new(5.0, 0.0, 0.0), 1.0), JerkSample::ZERO);
        // Out-of-order timestamp: same.
        assert_eq!(estimator.compute(Vector3::new(5.0, 0.0, 0.0), 0.5), JerkSample::ZERO);

        // A later valid sample differentiates against the original seed,
        // proving the guard did not overwrite stored state.
        let jerk = estimator.compute(Vector3::new(2.0, 0.0, 0.0), 1.5);
        assert!((jerk.x - 2.0).abs() < 1e-3); // (2-1)/0.5
    }

    #[test]
    fn test_reset_reseeds_state() {
        let mut estimator = JerkEstimator::new();
        estimator.compute(Vector3::new(1.0, 1.0, 1.0), 0.0);
        estimator.compute(Vector3::new(2.0, 2.0, 2.0), 0.02);
        estimator.reset();
        assert_eq!(estimator.compute(Vector3::new(9.0, 9.0, 9.0), 0.04), JerkSample::ZERO);
    }
}
