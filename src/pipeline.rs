//! The synchronous motion pipeline.
//!
//! Chains every per-sample processing stage in one call with no suspension
//! point between them:
//!
//! 1. [`VectorFilter`]: strip high-frequency vibration noise
//! 2. [`JerkEstimator`]: differentiate filtered acceleration
//! 3. [`RiskNormalizer`]: map jerk to bounded risk + spill flag
//! 4. [`TemporalSmoother`]: window-average the risk
//! 5. [`SurfaceEventDetector`]: classify vertical spikes independently
//!
//! The latency requirement is hard: from sensor callback to feedback decision
//! there are zero cross-thread handoffs inside this pipeline. Boundary
//! crossings happen only at the edges, in the session layer.

use serde::{Deserialize, Serialize};

use crate::jerk::{JerkEstimator, JerkSample};
use crate::risk::{DifficultyLevel, RiskNormalizer};
use crate::signal::{FilterConfig, TemporalSmoother, VectorFilter};
use crate::surface::{PotholeEvent, SurfaceConfig, SurfaceEventDetector};
use crate::types::Vector3;

/// Configuration for the complete pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Low-pass stage parameters.
    pub filter: FilterConfig,
    /// Risk smoothing window in milliseconds.
    pub smoothing_window_ms: f64,
    /// Vertical spike detector parameters.
    pub surface: SurfaceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            smoothing_window_ms: 500.0,
            surface: SurfaceConfig::default(),
        }
    }
}

/// Output of one pipeline tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOutput {
    /// Smoothed risk in [0, 1].
    pub risk: f32,
    /// True when the *raw* jerk reached the spill threshold this sample,
    /// before smoothing.
    pub is_spill: bool,
    /// Jerk values for display and logging.
    pub jerk: JerkSample,
    /// Filtered vertical acceleration (m/s²), fed to the surface detector.
    pub filtered_z: f32,
    /// Pothole event, if a vertical spike resolved this tick.
    pub pothole: Option<PotholeEvent>,
}

impl PipelineOutput {
    /// A zero-signal tick, used when input is malformed.
    pub const NEUTRAL: PipelineOutput = PipelineOutput {
        risk: 0.0,
        is_spill: false,
        jerk: JerkSample::ZERO,
        filtered_z: 0.0,
        pothole: None,
    };
}

/// Owns the five stages and runs them per sample.
#[derive(Debug, Clone)]
pub struct MotionPipeline {
    filter: VectorFilter,
    jerk: JerkEstimator,
    normalizer: RiskNormalizer,
    smoother: TemporalSmoother,
    surface: SurfaceEventDetector,
}

impl MotionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            filter: VectorFilter::new(config.filter),
            jerk: JerkEstimator::new(),
            normalizer: RiskNormalizer::default(),
            smoother: TemporalSmoother::new(config.smoothing_window_ms),
            surface: SurfaceEventDetector::new(config.surface),
        }
    }

    /// Runs one gravity-compensated acceleration sample (m/s², timestamp in
    /// seconds) through all stages.
    ///
    /// NaN/infinite input or timestamp degrades to [`PipelineOutput::NEUTRAL`]
    /// without touching any stage state.
    pub fn process(&mut self, accel: Vector3, timestamp_s: f64) -> PipelineOutput {
        if !accel.is_finite() || !timestamp_s.is_finite() {
            return PipelineOutput::NEUTRAL;
        }
        let timestamp_ms = timestamp_s * 1000.0;

        let filtered = self.filter.apply(accel);
        let jerk = self.jerk.compute(filtered, timestamp_s);
        let reading = self.normalizer.normalize(jerk.magnitude);
        let risk = self.smoother.add(reading.risk, timestamp_ms);
        let pothole = self.surface.detect(filtered.z, timestamp_ms);

        PipelineOutput {
            risk,
            is_spill: reading.is_spill,
            jerk,
            filtered_z: filtered.z,
            pothole,
        }
    }

    /// Switches risk thresholds; effective from the next sample.
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        self.normalizer.set_difficulty(difficulty);
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.normalizer.difficulty()
    }

    /// Resets every stage to its post-construction state.
    ///
    /// Required at session start and at the end of the settling period;
    /// a single stale stage (filter history, window contents, spike
    /// tracking) independently breaks downstream behavior.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.jerk.reset();
        self.smoother.reset();
        self.surface.reset();
    }
}
