//! Road-surface event detection from the vertical axis.
//!
//! Runs independently of the jerk/risk path: the vertical axis is excluded
//! from the roughness magnitude precisely because it encodes road texture,
//! and this detector is where that texture gets classified instead.
//!
//! Classification is duration-based:
//! - spikes resolving within 200 ms are potholes (unavoidable impacts);
//! - longer spikes are speed bumps, which a driver can anticipate, and are
//!   dropped silently;
//! - repeated potholes inside a 7 s window collapse into one "rough road"
//!   stretch so a bad surface does not machine-gun events.

use serde::{Deserialize, Serialize};

/// Tunables for the vertical spike detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Vertical deviation that starts a spike, in m/s². 3.9 m/s² (0.4 g)
    /// per road-surface monitoring literature.
    pub z_threshold: f32,
    /// Spikes longer than this are speed bumps, not potholes (ms).
    pub max_pothole_duration_ms: f64,
    /// Potholes inside this window cluster into one rough-road stretch (ms).
    pub cluster_window_ms: f64,
    /// A spike ends when deviation drops to this fraction of the start
    /// threshold. Plain threshold-crossing would end spikes early on noise.
    pub hysteresis_factor: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.9,
            max_pothole_duration_ms: 200.0,
            cluster_window_ms: 7000.0,
            hysteresis_factor: 0.5,
        }
    }
}

/// A resolved pothole impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotholeEvent {
    /// When the spike resolved, in milliseconds.
    pub timestamp_ms: f64,
    /// Peak vertical deviation during the spike (m/s²).
    pub peak_z: f32,
    /// Spike duration in milliseconds.
    pub duration_ms: f64,
    /// Whether scoring should forgive this event. Left false by the
    /// detector; the session owner decides.
    pub forgiven: bool,
}

/// Detects potholes and rough-road stretches on the vertical axis.
#[derive(Debug, Clone)]
pub struct SurfaceEventDetector {
    config: SurfaceConfig,
    spike_start_ms: Option<f64>,
    spike_peak: f32,
    last_pothole_ms: f64,
    in_rough_road: bool,
}

impl SurfaceEventDetector {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            spike_start_ms: None,
            spike_peak: 0.0,
            last_pothole_ms: f64::NEG_INFINITY,
            in_rough_road: false,
        }
    }

    /// Feeds one vertical acceleration sample (m/s², gravity-compensated).
    ///
    /// Returns a `PotholeEvent` when a spike resolves as a pothole and is
    /// not suppressed by rough-road clustering; `None` on every other tick.
    pub fn detect(&mut self, z_accel: f32, timestamp_ms: f64) -> Option<PotholeEvent> {
        if !z_accel.is_finite() || !timestamp_ms.is_finite() {
            return None;
        }
        let deviation = z_accel.abs();

        // Spike onset.
        if self.spike_start_ms.is_none() {
            if deviation > self.config.z_threshold {
                self.spike_start_ms = Some(timestamp_ms);
                self.spike_peak = deviation;
            }
            return None;
        }

        // Track running peak while the spike is live.
        if deviation > self.spike_peak {
            self.spike_peak = deviation;
        }

        // Spike ends only once deviation falls to the hysteresis level.
        if deviation > self.config.z_threshold * self.config.hysteresis_factor {
            return None;
        }

        let start_ms = self.spike_start_ms.take().unwrap_or(timestamp_ms);
        let duration_ms = timestamp_ms - start_ms;
        let peak_z = self.spike_peak;
        self.spike_peak = 0.0;

        // Long spike: speed bump, anticipatable, dropped.
        if duration_ms > self.config.max_pothole_duration_ms {
            return None;
        }

        let since_last = timestamp_ms - self.last_pothole_ms;
        let clustered = since_last < self.config.cluster_window_ms;
        self.last_pothole_ms = timestamp_ms;

        if clustered && self.in_rough_road {
            // Still inside a rough-road stretch; the first event already
            // covered it.
            return None;
        }
        self.in_rough_road = clustered;

        Some(PotholeEvent {
            timestamp_ms,
            peak_z,
            duration_ms,
            forgiven: false,
        })
    }

    /// True while inside a clustered rough-road stretch.
    pub fn in_rough_road(&self) -> bool {
        self.in_rough_road
    }

    /// Clears spike tracking and cluster state.
    pub fn reset(&mut self) {
        self.spike_start_ms = None;
        self.spike_peak = 0.0;
        self.last_pothole_ms = f64::NEG_INFINITY;
        self.in_rough_road = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SurfaceEventDetector {
        SurfaceEventDetector::new(SurfaceConfig::default())
    }

    /// Drives a spike of the given magnitude/duration and returns whatever
    /// the release sample produced.
    fn run_spike(
        det: &mut SurfaceEventDetector,
        start_ms: f64,
        peak: f32,
        duration_ms: f64,
    ) -> Option<PotholeEvent> {
        det.detect(peak, start_ms);
        det.detect(peak, start_ms + duration_ms / 2.0);
        det.detect(0.0, start_ms + duration_ms)
    }

    #[test]
    fn test_short_spike_is_pothole() {
        let mut det = detector();
        let event = run_spike(&mut det, 1000.0, 6.0, 100.0).expect("pothole");
        assert_eq!(event.peak_z, 6.0);
        assert_eq!(event.duration_ms, 100.0);
        assert!(!event.forgiven);
    }

    #[test]
    fn test_long_spike_is_speed_bump() {
        let mut det = detector();
        assert!(run_spike(&mut det, 1000.0, 6.0, 400.0).is_none());
    }

    #[test]
    fn test_sub_threshold_never_starts_spike() {
        let mut det = detector();
        for i in 0..50 {
            assert!(det.detect(3.0, i as f64 * 20.0).is_none());
        }
    }

    #[test]
    fn test_hysteresis_keeps_spike_alive() {
        let mut det = detector();
        det.detect(6.0, 0.0);
        // Deviation dips below the start threshold but stays above 50% of
        // it; the spike must not end yet.
        assert!(det.detect(2.5, 50.0).is_none());
        // Now it falls to the hysteresis level and resolves.
        let event = det.detect(1.0, 100.0).expect("pothole resolves");
        assert_eq!(event.duration_ms, 100.0);
    }

    #[test]
    fn test_peak_tracked_across_spike() {
        let mut det = detector();
        det.detect(5.0, 0.0);
        det.detect(8.5, 40.0);
        det.detect(4.5, 80.0);
        let event = det.detect(0.0, 120.0).expect("pothole");
        assert_eq!(event.peak_z, 8.5);
    }

    #[test]
    fn test_cluster_window_suppresses_repeats() {
        let mut det = detector();
        // First pothole after quiet road emits unclustered; the second
        // within 7 s enters rough-road mode and still emits; later ones
        // inside the window are suppressed.
        assert!(run_spike(&mut det, 0.0, 6.0, 100.0).is_some());
        assert!(run_spike(&mut det, 2000.0, 6.0, 100.0).is_some());
        assert!(det.in_rough_road());
        assert!(run_spike(&mut det, 4000.0, 6.0, 100.0).is_none());
        assert!(run_spike(&mut det, 6000.0, 6.0, 100.0).is_none());
    }

    #[test]
    fn test_cluster_window_lapse_rearms() {
        let mut det = detector();
        assert!(run_spike(&mut det, 0.0, 6.0, 100.0).is_some());
        assert!(run_spike(&mut det, 2000.0, 6.0, 100.0).is_some());
        assert!(run_spike(&mut det, 4000.0, 6.0, 100.0).is_none());
        // 8 s of quiet road: the window lapses and the next impact emits.
        let event = run_spike(&mut det, 13000.0, 6.0, 100.0);
        assert!(event.is_some());
        assert!(!det.in_rough_road());
    }

    #[test]
    fn test_reset_clears_cluster_and_spike_state() {
        let mut det = detector();
        run_spike(&mut det, 0.0, 6.0, 100.0);
        run_spike(&mut det, 2000.0, 6.0, 100.0);
        det.detect(6.0, 4000.0); // spike in flight
        det.reset();
        assert!(!det.in_rough_road());
        let event = run_spike(&mut det, 5000.0, 6.0, 100.0).expect("fresh state");
        assert_eq!(event.duration_ms, 100.0);
    }

    #[test]
    fn test_nan_input_is_ignored() {
        let mut det = detector();
        assert!(det.detect(f32::NAN, 0.0).is_none());
        // State untouched: a clean pothole still detects normally.
        assert!(run_spike(&mut det, 100.0, 6.0, 100.0).is_some());
    }
}
