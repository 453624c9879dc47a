//! GPS-driven drive-phase detection.
//!
//! A small finite-state machine turns the ~1 Hz speed stream into drive
//! start/end decisions:
//!
//! - `Idle → Detecting`: speed reaches 15 km/h
//! - `Detecting → Driving`: speed sustained 5 s (debounces device shakes)
//! - `Driving → Stopping`: speed drops under 1 m/s
//! - `Stopping → Driving`: speed resumes (a red light, not a trip end)
//! - `Stopping → Idle`: stationary 120 s (the trip is over)
//! - `ManualDriving`: user override; only a manual stop exits
//!
//! `process_location` is a pure function of `(state, fix)`; the caller
//! owns persisting the returned state and reacting to the emitted events.
//! Batched fixes (e.g. after process resume) must be replayed in order;
//! skipping one can hide an intervening transition.

use serde::{Deserialize, Serialize};

use crate::types::LocationFix;

/// Speed that starts drive detection: 15 km/h in m/s.
pub const SPEED_THRESHOLD_MPS: f32 = 4.17;

/// How long speed must stay above threshold before a drive starts.
pub const START_DURATION_MS: u64 = 5_000;

/// Speed below which the vehicle counts as stationary.
pub const STATIONARY_THRESHOLD_MPS: f32 = 1.0;

/// How long the vehicle must stay stationary before the drive ends.
/// Long enough to sit through a red light without ending the trip.
pub const STOP_DURATION_MS: u64 = 120_000;

/// One phase of the drive-detection state machine.
///
/// Exactly one variant is active per session. Every transition site
/// matches exhaustively; there is no fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DriveState {
    /// Not driving.
    Idle,
    /// Speed is above threshold; waiting out the debounce.
    Detecting { since_ms: u64 },
    /// A drive is in progress.
    Driving { started_at_ms: u64 },
    /// Nearly stationary; waiting out the stop grace period.
    Stopping {
        stationary_since_ms: u64,
        drive_started_at_ms: u64,
    },
    /// User-forced drive; automatic stop logic is disabled.
    ManualDriving { started_at_ms: u64 },
}

impl DriveState {
    /// True for any phase in which a drive is underway.
    pub fn is_driving(&self) -> bool {
        matches!(
            self,
            DriveState::Driving { .. }
                | DriveState::Stopping { .. }
                | DriveState::ManualDriving { .. }
        )
    }

    /// Drive start time, when one is underway.
    pub fn started_at_ms(&self) -> Option<u64> {
        match self {
            DriveState::Driving { started_at_ms }
            | DriveState::ManualDriving { started_at_ms } => Some(*started_at_ms),
            DriveState::Stopping {
                drive_started_at_ms, ..
            } => Some(*drive_started_at_ms),
            DriveState::Idle | DriveState::Detecting { .. } => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DriveState::Idle => "idle",
            DriveState::Detecting { .. } => "detecting",
            DriveState::Driving { .. } => "driving",
            DriveState::Stopping { .. } => "stopping",
            DriveState::ManualDriving { .. } => "manual_driving",
        }
    }
}

/// Result of feeding one fix through the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the fix.
    pub state: DriveState,
    /// A drive started on this fix (fires exactly once per drive).
    pub drive_started: bool,
    /// A drive ended on this fix (fires exactly once per drive).
    pub drive_ended: bool,
}

/// Advances the state machine by one GPS fix.
///
/// Side-effect free: returns the next state and event flags, mutating
/// nothing. Missing speed reads as 0 (GPS without a velocity lock is
/// indistinguishable from standing still for our purposes).
pub fn process_location(current: DriveState, fix: &LocationFix) -> Transition {
    let speed = fix.speed_or_zero();
    let now = fix.timestamp_ms;

    let mut next = current;
    let mut drive_started = false;
    let mut drive_ended = false;

    match current {
        DriveState::Idle => {
            if speed >= SPEED_THRESHOLD_MPS {
                next = DriveState::Detecting { since_ms: now };
            }
        }
        DriveState::Detecting { since_ms } => {
            if speed < SPEED_THRESHOLD_MPS {
                next = DriveState::Idle;
            } else if now.saturating_sub(since_ms) >= START_DURATION_MS {
                next = DriveState::Driving {
                    started_at_ms: since_ms,
                };
                drive_started = true;
            }
        }
        DriveState::Driving { started_at_ms } => {
            if speed < STATIONARY_THRESHOLD_MPS {
                next = DriveState::Stopping {
                    stationary_since_ms: now,
                    drive_started_at_ms: started_at_ms,
                };
            }
        }
        DriveState::Stopping {
            stationary_since_ms,
            drive_started_at_ms,
        } => {
            if speed >= STATIONARY_THRESHOLD_MPS {
                next = DriveState::Driving {
                    started_at_ms: drive_started_at_ms,
                };
            } else if now.saturating_sub(stationary_since_ms) >= STOP_DURATION_MS {
                next = DriveState::Idle;
                drive_ended = true;
            }
        }
        // Automatic logic is disabled; only stop_manual exits.
        DriveState::ManualDriving { .. } => {}
    }

    Transition {
        state: next,
        drive_started,
        drive_ended,
    }
}

/// Forces a manual drive from any non-manual state.
///
/// An existing drive start time is preserved (driving/stopping); otherwise
/// the caller's `now_ms` becomes the start.
pub fn start_manual(current: DriveState, now_ms: u64) -> DriveState {
    match current {
        DriveState::Idle | DriveState::Detecting { .. } => DriveState::ManualDriving {
            started_at_ms: now_ms,
        },
        DriveState::Driving { started_at_ms } => DriveState::ManualDriving { started_at_ms },
        DriveState::Stopping {
            drive_started_at_ms,
            ..
        } => DriveState::ManualDriving {
            started_at_ms: drive_started_at_ms,
        },
        DriveState::ManualDriving { .. } => current,
    }
}

/// Forces idle from any driving-family state; no-op otherwise.
pub fn stop_manual(current: DriveState) -> DriveState {
    match current {
        DriveState::Driving { .. }
        | DriveState::Stopping { .. }
        | DriveState::ManualDriving { .. } => DriveState::Idle,
        DriveState::Idle | DriveState::Detecting { .. } => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(t_ms: u64, speed: f32) -> LocationFix {
        LocationFix::new(t_ms, Some(speed))
    }

    /// Replays a series of fixes; returns the final state and how many
    /// times each event fired.
    fn replay(mut state: DriveState, fixes: &[LocationFix]) -> (DriveState, u32, u32) {
        let (mut starts, mut ends) = (0, 0);
        for f in fixes {
            let t = process_location(state, f);
            state = t.state;
            starts += t.drive_started as u32;
            ends += t.drive_ended as u32;
        }
        (state, starts, ends)
    }

    #[test]
    fn test_idle_to_detecting_on_threshold_speed() {
        let t = process_location(DriveState::Idle, &fix(1_000, 5.0));
        assert_eq!(t.state, DriveState::Detecting { since_ms: 1_000 });
        assert!(!t.drive_started);
    }

    #[test]
    fn test_slow_speed_stays_idle() {
        let t = process_location(DriveState::Idle, &fix(1_000, 4.0));
        assert_eq!(t.state, DriveState::Idle);
    }

    #[test]
    fn test_detecting_falls_back_to_idle() {
        let state = DriveState::Detecting { since_ms: 0 };
        let t = process_location(state, &fix(2_000, 2.0));
        assert_eq!(t.state, DriveState::Idle);
    }

    #[test]
    fn test_sustained_speed_starts_drive_once() {
        // 20 km/h (5.56 m/s) held for 5.5 s from idle: idle → detecting →
        // driving, drive-started exactly once, at the 5 s mark.
        let fixes: Vec<LocationFix> = (0..6).map(|i| fix(i * 1_000, 5.56)).collect();
        let (state, starts, ends) = replay(DriveState::Idle, &fixes);
        assert_eq!(state, DriveState::Driving { started_at_ms: 0 });
        assert_eq!(starts, 1);
        assert_eq!(ends, 0);
    }

    #[test]
    fn test_drive_start_preserves_detection_onset() {
        // The drive's start time is when speed first crossed the
        // threshold, not when the debounce elapsed.
        let state = DriveState::Detecting { since_ms: 7_000 };
        let t = process_location(state, &fix(12_000, 6.0));
        assert!(t.drive_started);
        assert_eq!(t.state, DriveState::Driving { started_at_ms: 7_000 });
    }

    #[test]
    fn test_brief_stop_resumes_driving() {
        let driving = DriveState::Driving { started_at_ms: 0 };
        let t = process_location(driving, &fix(60_000, 0.0));
        assert_eq!(
            t.state,
            DriveState::Stopping {
                stationary_since_ms: 60_000,
                drive_started_at_ms: 0
            }
        );

        // Light turns green 30 s later.
        let t = process_location(t.state, &fix(90_000, 3.0));
        assert_eq!(t.state, DriveState::Driving { started_at_ms: 0 });
        assert!(!t.drive_ended);
    }

    #[test]
    fn test_long_stop_ends_drive_once() {
        // From driving, 0 km/h sustained 125 s: driving → stopping → idle,
        // drive-ended exactly once, at ≥120 s after stationary onset.
        let mut fixes = vec![fix(10_000, 8.0)];
        for i in 0..126u64 {
            fixes.push(fix(11_000 + i * 1_000, 0.0));
        }
        let (state, _, ends) = replay(DriveState::Driving { started_at_ms: 0 }, &fixes);
        assert_eq!(state, DriveState::Idle);
        assert_eq!(ends, 1);

        // End fires no earlier than 120 s of stationary time.
        let mut state = DriveState::Driving { started_at_ms: 0 };
        let mut end_ms = None;
        for i in 0..130u64 {
            let t = process_location(state, &fix(11_000 + i * 1_000, 0.0));
            state = t.state;
            if t.drive_ended {
                end_ms = Some(11_000 + i * 1_000);
                break;
            }
        }
        assert_eq!(end_ms, Some(131_000)); // stationary onset 11 s + 120 s
    }

    #[test]
    fn test_missing_speed_reads_as_stationary() {
        let driving = DriveState::Driving { started_at_ms: 0 };
        let t = process_location(driving, &LocationFix::new(50_000, None));
        assert!(matches!(t.state, DriveState::Stopping { .. }));
    }

    #[test]
    fn test_manual_driving_ignores_auto_stop() {
        let manual = DriveState::ManualDriving { started_at_ms: 0 };
        // Hours of stationary fixes change nothing.
        let fixes: Vec<LocationFix> = (0..300).map(|i| fix(i * 1_000, 0.0)).collect();
        let (state, starts, ends) = replay(manual, &fixes);
        assert_eq!(state, manual);
        assert_eq!(starts, 0);
        assert_eq!(ends, 0);
    }

    #[test]
    fn test_start_manual_preserves_existing_start_time() {
        let driving = DriveState::Driving { started_at_ms: 42 };
        assert_eq!(
            start_manual(driving, 1_000),
            DriveState::ManualDriving { started_at_ms: 42 }
        );

        let stopping = DriveState::Stopping {
            stationary_since_ms: 500,
            drive_started_at_ms: 42,
        };
        assert_eq!(
            start_manual(stopping, 1_000),
            DriveState::ManualDriving { started_at_ms: 42 }
        );

        assert_eq!(
            start_manual(DriveState::Idle, 1_000),
            DriveState::ManualDriving { started_at_ms: 1_000 }
        );
    }

    #[test]
    fn test_stop_manual_exits_driving_family_only() {
        assert_eq!(
            stop_manual(DriveState::ManualDriving { started_at_ms: 0 }),
            DriveState::Idle
        );
        assert_eq!(
            stop_manual(DriveState::Driving { started_at_ms: 0 }),
            DriveState::Idle
        );
        let detecting = DriveState::Detecting { since_ms: 0 };
        assert_eq!(stop_manual(detecting), detecting);
        assert_eq!(stop_manual(DriveState::Idle), DriveState::Idle);
    }

    #[test]
    fn test_batch_replay_catches_intervening_stop() {
        // A buffered batch containing a full stop and restart must yield
        // both the end of the first drive and the start of the second.
        let mut fixes = Vec::new();
        // Cruise 10 s.
        for i in 0..10u64 {
            fixes.push(fix(i * 1_000, 10.0));
        }
        // Stationary 125 s.
        for i in 0..125u64 {
            fixes.push(fix(10_000 + i * 1_000, 0.0));
        }
        // Drive off again for 7 s.
        for i in 0..7u64 {
            fixes.push(fix(135_000 + i * 1_000, 10.0));
        }
        let (state, starts, ends) = replay(DriveState::Driving { started_at_ms: 0 }, &fixes);
        assert_eq!(ends, 1);
        assert_eq!(starts, 1);
        assert!(matches!(state, DriveState::Driving { .. }));
    }
}
