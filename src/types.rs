//! Core data types for the driving-smoothness engine.
//!
//! This module defines the fundamental types shared across the motion
//! pipeline, the drive classifier, and the feedback layer. All types are
//! designed to minimize allocation and make intent obvious: if a concept
//! exists, it gets a type. Never pass raw tuples or untyped collections
//! across boundaries.
//!
//! Timestamp conventions:
//! - Accelerometer samples carry seconds (`f64`), matching the sensor API.
//! - GPS fixes and drive-phase timers carry milliseconds (`u64`).
//! - Pipeline-internal timers (smoothing window, cooldowns) use
//!   milliseconds as `f64`, derived from the sample timestamps.

use serde::{Deserialize, Serialize};

/// A 3-axis vector reading.
///
/// Units are m/s² for acceleration and rad/s for rotation. The device frame
/// is assumed gravity-compensated: x is lateral (cornering), y is
/// longitudinal (accel/brake), z is vertical (road surface).
///
/// Design note: f32 components are plenty for on-device motion work and
/// halve the memory traffic of the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    /// Creates a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Full 3-axis magnitude.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// True if every component is a finite number.
    ///
    /// Samples failing this check are dropped at the pipeline boundary
    /// rather than propagated into filter state.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A single GPS fix as delivered by the location layer.
///
/// Fixes arrive at roughly 1 Hz but may be delivered in batches after the
/// process resumes from the background; callers must replay batches through
/// the drive classifier in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Ground speed in m/s. `None` when the receiver has no velocity
    /// solution; the classifier reads this as 0.
    pub speed_mps: Option<f32>,
    /// Fix timestamp in Unix milliseconds.
    pub timestamp_ms: u64,
    /// Horizontal accuracy radius in meters, when reported.
    pub accuracy_m: Option<f32>,
}

impl LocationFix {
    /// Creates a fix with only the fields the classifier consumes.
    pub fn new(timestamp_ms: u64, speed_mps: Option<f32>) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            speed_mps,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    /// Speed with the missing-velocity case collapsed to zero.
    pub fn speed_or_zero(&self) -> f32 {
        self.speed_mps.unwrap_or(0.0)
    }
}

/// Discrete feedback sounds the audio layer can play.
///
/// The engine never touches audio assets; it only names which one-shot
/// sound the current tick calls for. Graduated slosh intensities map to the
/// light/medium/heavy risk zones, `Spill` to the spill event itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackSound {
    SloshLight,
    SloshMedium,
    SloshHeavy,
    Spill,
}

impl FeedbackSound {
    /// Stable asset name understood by the playback layer.
    pub fn asset_name(&self) -> &'static str {
        match self {
            FeedbackSound::SloshLight => "slosh-light",
            FeedbackSound::SloshMedium => "slosh-medium",
            FeedbackSound::SloshHeavy => "slosh-heavy",
            FeedbackSound::Spill => "spill",
        }
    }
}

/// Configuration errors surfaced at the setter/parse boundary.
///
/// Processing paths never return errors; malformed samples degrade to
/// neutral outputs instead. Only configuration is allowed to fail, and it
/// fails before a session starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A difficulty name did not match any known level.
    #[error("unknown difficulty level: {0:?}")]
    UnknownDifficulty(String),
    /// A filter parameter was outside its valid range.
    #[error("invalid filter parameter {name}: {value}")]
    InvalidFilterParameter { name: &'static str, value: f32 },
}
