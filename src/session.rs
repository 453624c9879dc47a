//! Drive session orchestration.
//!
//! [`DriveSession`] is the single owner of all composed state: the motion
//! pipeline, the feedback arbiter, the ambient modulator, the drive
//! classifier state, and the per-drive event log. The integration layer
//! pushes raw data in (accelerometer samples, GPS fix batches, manual
//! start/stop) and receives typed outputs back: per-tick results, sound
//! selections, drive transitions, and the final score.
//!
//! Threading contract: the motion path (`handle_sample`) runs on the
//! sensor callback at ~50 Hz and is fully synchronous; GPS handling runs
//! on its own ~1 Hz callback. No memory is shared between them except
//! through this owner, which a single thread mutates.
//!
//! Session boundaries are strict: starting and ending a drive fully
//! resets every pipeline stage, the arbiter, the ambient modulator, and
//! the sample log. One stale stage is enough to corrupt the next session.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::ambient::{AmbientConfig, AmbientModulator};
use crate::drive::{self, DriveState};
use crate::export::{SampleEvent, SampleLog, SampleRow};
use crate::feedback::{FeedbackArbiter, FeedbackConfig, RiskZone};
use crate::jerk::JerkSample;
use crate::pipeline::{MotionPipeline, PipelineConfig};
use crate::risk::DifficultyLevel;
use crate::score::{calculate_score, ScoreResult, SpillEvent};
use crate::surface::PotholeEvent;
use crate::types::{ConfigError, FeedbackSound, LocationFix, Vector3};

/// Top-level configuration bundling every component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    pub pipeline: PipelineConfig,
    pub feedback: FeedbackConfig,
    pub ambient: AmbientConfig,
    /// Settling period after sensor start (ms). Samples are consumed but
    /// feedback stays suppressed, then all stages reset, which discards
    /// the transient from mounting the device.
    pub settling_ms: f64,
    /// Whether to buffer per-tick rows for CSV export during drives.
    pub record_samples: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            feedback: FeedbackConfig::default(),
            ambient: AmbientConfig::default(),
            settling_ms: 1_500.0,
            record_samples: false,
        }
    }
}

/// Transition notifications for the integration layer.
///
/// Replaces reactive-store subscriptions: the session calls these as
/// events happen, and the default impls make every notification opt-in.
pub trait SessionObserver {
    /// A discrete feedback sound should play now.
    fn on_sound(&mut self, _sound: FeedbackSound) {}
    /// The ambient volume changed (one interpolation tick).
    fn on_volume(&mut self, _volume: f32) {}
    /// A drive began (auto-detected or manual).
    fn on_drive_started(&mut self, _started_at_ms: u64, _manual: bool) {}
    /// A drive ended; the summary carries the score.
    fn on_drive_ended(&mut self, _summary: &SessionSummary) {}
    /// The spill cooldown window opened or closed.
    fn on_cooldown_change(&mut self, _in_cooldown: bool) {}
    /// A pothole resolved during an active drive.
    fn on_pothole(&mut self, _event: &PotholeEvent) {}
}

/// Result of one motion tick, for UI/audio consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Smoothed risk in [0, 1]; zero while settling or stopped.
    pub risk: f32,
    /// Raw spill flag for this tick.
    pub is_spill: bool,
    /// Jerk values for display.
    pub jerk: JerkSample,
    /// Pothole event, if one resolved this tick.
    pub pothole: Option<PotholeEvent>,
    /// Sound selected by the arbiter, if any.
    pub sound: Option<FeedbackSound>,
    /// True while the settling period suppresses evaluation.
    pub settling: bool,
}

impl TickOutput {
    const QUIET: TickOutput = TickOutput {
        risk: 0.0,
        is_spill: false,
        jerk: JerkSample::ZERO,
        pothole: None,
        sound: None,
        settling: false,
    };
}

/// Completed-drive summary, the session's final output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub duration_ms: u64,
    pub spill_count: u32,
    pub pothole_count: u32,
    pub manual_start: bool,
    pub manual_end: bool,
    pub difficulty: DifficultyLevel,
    pub score: ScoreResult,
}

/// Sensor-side lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SensorPhase {
    Stopped,
    Settling { until_ms: f64 },
    Active,
}

/// Per-drive accumulation, created on drive start.
#[derive(Debug, Clone)]
struct ActiveDrive {
    started_at_ms: u64,
    manual_start: bool,
    spills: Vec<SpillEvent>,
    pothole_count: u32,
}

/// The session owner. See module docs.
pub struct DriveSession {
    config: SessionConfig,
    pipeline: MotionPipeline,
    arbiter: FeedbackArbiter,
    ambient: AmbientModulator,
    drive_state: DriveState,
    sensor_phase: SensorPhase,
    active_drive: Option<ActiveDrive>,
    sample_log: SampleLog,
    last_speed_mps: Option<f32>,
    observer: Option<Box<dyn SessionObserver>>,
}

impl DriveSession {
    /// Builds a session, rejecting invalid configuration up front.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.pipeline.filter.validate()?;
        Ok(Self {
            pipeline: MotionPipeline::new(config.pipeline),
            arbiter: FeedbackArbiter::new(config.feedback),
            ambient: AmbientModulator::new(config.ambient),
            drive_state: DriveState::Idle,
            sensor_phase: SensorPhase::Stopped,
            active_drive: None,
            sample_log: SampleLog::new(),
            last_speed_mps: None,
            observer: None,
            config,
        })
    }

    /// Registers the transition observer.
    pub fn set_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    // ------------------------------------------------------------------
    // Sensor lifecycle
    // ------------------------------------------------------------------

    /// Starts the motion pipeline; feedback stays suppressed until the
    /// settling period elapses.
    pub fn start_sensors(&mut self, now_ms: f64) {
        self.pipeline.reset();
        self.sensor_phase = SensorPhase::Settling {
            until_ms: now_ms + self.config.settling_ms,
        };
        info!("sensors started, settling for {:.0} ms", self.config.settling_ms);
    }

    /// Stops the motion pipeline and discards its state.
    pub fn stop_sensors(&mut self) {
        self.sensor_phase = SensorPhase::Stopped;
        self.pipeline.reset();
        info!("sensors stopped");
    }

    /// True while the settling period suppresses feedback.
    pub fn is_settling(&self) -> bool {
        matches!(self.sensor_phase, SensorPhase::Settling { .. })
    }

    // ------------------------------------------------------------------
    // Motion path (~50 Hz)
    // ------------------------------------------------------------------

    /// Processes one accelerometer sample (m/s², timestamp in seconds).
    ///
    /// Fully synchronous: filter → jerk → risk → smoothing → surface →
    /// arbiter, all within this call.
    pub fn handle_sample(&mut self, accel: Vector3, timestamp_s: f64) -> TickOutput {
        let timestamp_ms = timestamp_s * 1000.0;

        match self.sensor_phase {
            SensorPhase::Stopped => return TickOutput::QUIET,
            SensorPhase::Settling { until_ms } => {
                if timestamp_ms < until_ms {
                    // Prime the filters, suppress everything else.
                    self.pipeline.process(accel, timestamp_s);
                    return TickOutput {
                        settling: true,
                        ..TickOutput::QUIET
                    };
                }
                // Settling over: drop the startup transient and let this
                // sample be the first of the clean stream.
                self.pipeline.reset();
                self.sensor_phase = SensorPhase::Active;
                debug!("settling complete, pipeline reset");
            }
            SensorPhase::Active => {}
        }

        let out = self.pipeline.process(accel, timestamp_s);
        let mut sound = None;

        if self.drive_state.is_driving() && self.active_drive.is_some() {
            let cooldown_before = self.arbiter.is_in_cooldown();
            sound = self.arbiter.evaluate(out.risk, out.is_spill, timestamp_ms);
            let cooldown_after = self.arbiter.is_in_cooldown();

            self.ambient.set_risk_level(out.risk);

            if self.config.record_samples {
                self.sample_log.push(SampleRow {
                    timestamp_ms,
                    accel,
                    jerk: out.jerk,
                    risk: out.risk,
                    z_accel: out.filtered_z,
                    speed_mps: self.last_speed_mps,
                    event: SampleEvent::None,
                });
            }

            if sound == Some(FeedbackSound::Spill) {
                self.record_spill(out.risk, timestamp_ms);
            }
            if let Some(pothole) = out.pothole {
                self.record_pothole(&pothole);
            }
            if let Some(s) = sound {
                if let Some(obs) = self.observer.as_deref_mut() {
                    obs.on_sound(s);
                }
            }
            if cooldown_before != cooldown_after {
                if let Some(obs) = self.observer.as_deref_mut() {
                    obs.on_cooldown_change(cooldown_after);
                }
            }
        }

        TickOutput {
            risk: out.risk,
            is_spill: out.is_spill,
            jerk: out.jerk,
            pothole: out.pothole,
            sound,
            settling: false,
        }
    }

    fn record_spill(&mut self, severity: f32, timestamp_ms: f64) {
        if let Some(drive) = self.active_drive.as_mut() {
            drive.spills.push(SpillEvent::new(severity));
            info!(
                "spill {} at {:.0} ms, severity {:.2}",
                drive.spills.len(),
                timestamp_ms,
                severity
            );
        }
        self.ambient.on_spill(timestamp_ms);
        self.sample_log.mark_event(SampleEvent::Spill);
    }

    fn record_pothole(&mut self, event: &PotholeEvent) {
        if let Some(drive) = self.active_drive.as_mut() {
            drive.pothole_count += 1;
            debug!(
                "pothole at {:.0} ms, peak {:.1} m/s², {:.0} ms",
                event.timestamp_ms, event.peak_z, event.duration_ms
            );
        }
        self.sample_log.mark_event(SampleEvent::Pothole);
        if let Some(obs) = self.observer.as_deref_mut() {
            obs.on_pothole(event);
        }
    }

    // ------------------------------------------------------------------
    // GPS path (~1 Hz, possibly batched)
    // ------------------------------------------------------------------

    /// Replays a batch of GPS fixes through the drive classifier in
    /// arrival order.
    ///
    /// Returns a summary for every drive that ended inside the batch
    /// (normally zero or one; a long buffered gap can hold more).
    pub fn handle_fixes(&mut self, fixes: &[LocationFix]) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for fix in fixes {
            self.last_speed_mps = fix.speed_mps;

            let transition = drive::process_location(self.drive_state, fix);
            if transition.state != self.drive_state {
                debug!(
                    "drive state {} -> {} at {:.1} m/s",
                    self.drive_state.name(),
                    transition.state.name(),
                    fix.speed_or_zero()
                );
            }
            self.drive_state = transition.state;

            if transition.drive_started {
                let started_at = self
                    .drive_state
                    .started_at_ms()
                    .unwrap_or(fix.timestamp_ms);
                self.begin_drive(started_at, false);
            }
            if transition.drive_ended {
                summaries.push(self.end_drive(fix.timestamp_ms, false));
            }
        }
        summaries
    }

    /// Forces a manual drive start.
    pub fn start_manual(&mut self, now_ms: u64) {
        let was_driving = self.drive_state.is_driving();
        self.drive_state = drive::start_manual(self.drive_state, now_ms);
        if !was_driving {
            let started_at = self.drive_state.started_at_ms().unwrap_or(now_ms);
            self.begin_drive(started_at, true);
        }
    }

    /// Forces a manual drive stop; returns the summary when a drive was
    /// actually underway.
    pub fn stop_manual(&mut self, now_ms: u64) -> Option<SessionSummary> {
        if !self.drive_state.is_driving() {
            return None;
        }
        self.drive_state = drive::stop_manual(self.drive_state);
        Some(self.end_drive(now_ms, true))
    }

    // ------------------------------------------------------------------
    // Ambient path (~30 Hz)
    // ------------------------------------------------------------------

    /// One ambient interpolation tick; returns the volume to apply.
    pub fn ambient_tick(&mut self, now_ms: f64) -> f32 {
        let volume = self.ambient.tick(now_ms);
        if let Some(obs) = self.observer.as_deref_mut() {
            obs.on_volume(volume);
        }
        volume
    }

    // ------------------------------------------------------------------
    // Drive lifecycle
    // ------------------------------------------------------------------

    fn begin_drive(&mut self, started_at_ms: u64, manual: bool) {
        if self.active_drive.is_some() {
            // Safety net: a new start while one is active closes the old
            // drive at its own start time.
            info!("drive started while one active; ending previous");
            self.end_drive(started_at_ms, false);
        }

        self.arbiter.reset();
        self.ambient.start();
        if self.config.record_samples {
            self.sample_log.start_recording();
        }
        self.active_drive = Some(ActiveDrive {
            started_at_ms,
            manual_start: manual,
            spills: Vec::new(),
            pothole_count: 0,
        });

        info!(
            "drive started at {} ({})",
            started_at_ms,
            if manual { "manual" } else { "auto" }
        );
        if let Some(obs) = self.observer.as_deref_mut() {
            obs.on_drive_started(started_at_ms, manual);
        }
    }

    fn end_drive(&mut self, ended_at_ms: u64, manual: bool) -> SessionSummary {
        let drive = self.active_drive.take().unwrap_or(ActiveDrive {
            started_at_ms: ended_at_ms,
            manual_start: manual,
            spills: Vec::new(),
            pothole_count: 0,
        });

        let duration_ms = ended_at_ms.saturating_sub(drive.started_at_ms);
        let score = calculate_score(&drive.spills, duration_ms);
        let summary = SessionSummary {
            started_at_ms: drive.started_at_ms,
            ended_at_ms,
            duration_ms,
            spill_count: drive.spills.len() as u32,
            pothole_count: drive.pothole_count,
            manual_start: drive.manual_start,
            manual_end: manual,
            difficulty: self.pipeline.difficulty(),
            score,
        };

        // Full teardown: nothing carries into the next drive.
        self.pipeline.reset();
        self.arbiter.reset();
        self.ambient.reset();
        self.sample_log.stop_recording();

        info!(
            "drive ended: {} ms, {} spills, score {}{}",
            summary.duration_ms,
            summary.spill_count,
            summary.score.score,
            if summary.score.is_perfect { " (perfect)" } else { "" }
        );
        if let Some(obs) = self.observer.as_deref_mut() {
            obs.on_drive_ended(&summary);
        }
        summary
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Switches difficulty; applies from the next sample.
    pub fn set_difficulty(&mut self, difficulty: DifficultyLevel) {
        debug!("difficulty set to {}", difficulty.as_str());
        self.pipeline.set_difficulty(difficulty);
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.pipeline.difficulty()
    }

    pub fn drive_state(&self) -> DriveState {
        self.drive_state
    }

    /// Risk zone the arbiter currently holds (for UI display).
    pub fn current_zone(&self) -> RiskZone {
        self.arbiter.current_zone()
    }

    /// True while the spill cooldown window is open.
    pub fn is_spill_on_cooldown(&self) -> bool {
        self.arbiter.is_spill_blocked()
    }

    /// Buffered sample rows rendered as CSV.
    pub fn sample_csv(&self) -> String {
        self.sample_log.to_csv()
    }

    /// Number of buffered sample rows.
    pub fn sample_count(&self) -> usize {
        self.sample_log.len()
    }
}
