//! Driving-smoothness engine.
//!
//! Converts raw motion and location telemetry from a handheld device into
//! real-time feedback and a post-drive quality score: the "full cup of
//! water on the dashboard" metaphor made audible. Harsh braking, cornering,
//! and throttle show up as jerk; jerk becomes a bounded risk value; risk
//! drives graduated slosh sounds, a spill event when the driver overdoes
//! it, and an ambient tension bed. At drive end the spill log reduces to a
//! 0–100 score.
//!
//! # Design principles
//!
//! - **Synchronous hot path**: from accelerometer callback to feedback
//!   decision there is a single call chain with no async boundary.
//! - **Pure state machines**: drive detection and feedback arbitration are
//!   functions of `(state, input, timestamp)`; callers own the state.
//! - **Injected time**: no component reads a wall clock. Every timer takes
//!   the caller's timestamp, so tests run on synthetic time.
//! - **Errors only at the config boundary**: malformed samples degrade to
//!   neutral outputs; only configuration can fail, and it fails early.
//!
//! # Example
//!
//! ```
//! use cupcoach_core::session::{DriveSession, SessionConfig};
//! use cupcoach_core::types::{LocationFix, Vector3};
//!
//! let mut session = DriveSession::new(SessionConfig::default()).unwrap();
//! session.start_sensors(0.0);
//!
//! // GPS says we are moving; after the 5 s debounce a drive begins.
//! let fixes: Vec<LocationFix> =
//!     (0..6).map(|i| LocationFix::new(i * 1_000, Some(10.0))).collect();
//! session.handle_fixes(&fixes);
//!
//! // 50 Hz accelerometer samples flow through the pipeline.
//! let out = session.handle_sample(Vector3::new(0.1, 0.0, 0.0), 6.0);
//! assert!(out.risk >= 0.0 && out.risk <= 1.0);
//!
//! // Ending the drive yields the score.
//! let summary = session.stop_manual(300_000).unwrap();
//! assert!(summary.score.score <= 100);
//! ```

pub mod ambient;
pub mod drive;
pub mod export;
pub mod feedback;
pub mod jerk;
pub mod pipeline;
pub mod risk;
pub mod score;
pub mod session;
pub mod signal;
pub mod surface;
pub mod types;


// Re-export the types most integrations touch.
pub use drive::DriveState;
pub use feedback::RiskZone;
pub use pipeline::{MotionPipeline, PipelineConfig, PipelineOutput};
pub use risk::DifficultyLevel;
pub use score::{calculate_score, ScoreResult, SpillEvent};
pub use session::{DriveSession, SessionConfig, SessionObserver, SessionSummary, TickOutput};
pub use types::{ConfigError, FeedbackSound, LocationFix, Vector3};
