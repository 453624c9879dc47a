//! Per-tick sample logging and CSV export.
//!
//! During a drive, the session can buffer one row per pipeline tick:
//! filtered acceleration, jerk, risk, raw vertical channel, GPS speed, and
//! an event marker. The rendered CSV is the raw material for tuning
//! difficulty thresholds against real driving data.
//!
//! Recording is opt-in and bounded: once the row cap is reached, further
//! samples are dropped with a warning rather than growing without limit
//! on a long drive.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::jerk::JerkSample;
use crate::types::Vector3;

/// Event marker attached to a logged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEvent {
    #[default]
    None,
    Spill,
    Pothole,
}

impl SampleEvent {
    fn csv_label(&self) -> &'static str {
        match self {
            SampleEvent::None => "",
            SampleEvent::Spill => "spill",
            SampleEvent::Pothole => "pothole",
        }
    }
}

/// One logged pipeline tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    /// Sample timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Filtered acceleration (m/s²).
    pub accel: Vector3,
    /// Jerk for this tick (m/s³).
    pub jerk: JerkSample,
    /// Smoothed risk in [0, 1].
    pub risk: f32,
    /// Raw vertical acceleration for pothole analysis (m/s²).
    pub z_accel: f32,
    /// GPS speed at the closest fix, when known (m/s).
    pub speed_mps: Option<f32>,
    /// Event marker, set after the fact via `mark_event`.
    pub event: SampleEvent,
}

/// Buffers sample rows for one recording session.
#[derive(Debug, Clone)]
pub struct SampleLog {
    rows: Vec<SampleRow>,
    recording: bool,
    max_rows: usize,
    dropped: u64,
}

/// Default cap: two hours of 50 Hz samples.
const DEFAULT_MAX_ROWS: usize = 360_000;

impl SampleLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ROWS)
    }

    /// Creates a log with a custom row cap.
    pub fn with_capacity(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            recording: false,
            max_rows,
            dropped: 0,
        }
    }

    /// Begins a fresh recording, discarding any previous rows.
    pub fn start_recording(&mut self) {
        self.rows.clear();
        self.dropped = 0;
        self.recording = true;
    }

    /// Stops recording; buffered rows stay available for export.
    pub fn stop_recording(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Appends a row while recording; no-op otherwise.
    pub fn push(&mut self, row: SampleRow) {
        if !self.recording {
            return;
        }
        if self.rows.len() >= self.max_rows {
            if self.dropped == 0 {
                warn!("sample log full at {} rows; dropping further samples", self.max_rows);
            }
            self.dropped += 1;
            return;
        }
        self.rows.push(row);
    }

    /// Marks the most recent row with an event.
    ///
    /// Events are detected by the tick that produced the row, so "the last
    /// row" is always the right one.
    pub fn mark_event(&mut self, event: SampleEvent) {
        if !self.recording {
            return;
        }
        if let Some(last) = self.rows.last_mut() {
            last.event = event;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows dropped after the cap was hit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn rows(&self) -> &[SampleRow] {
        &self.rows
    }

    /// Renders all buffered rows as CSV with a fixed header.
    pub fn to_csv(&self) -> String {
        let mut csv = String::with_capacity(64 + self.rows.len() * 96);
        csv.push_str("timestamp_ms,x,y,z,jerk_x,jerk_y,jerk_magnitude,risk,z_accel,speed_mps,event\n");
        for row in &self.rows {
            let speed = row
                .speed_mps
                .map(|s| format!("{s:.2}"))
                .unwrap_or_default();
            csv.push_str(&format!(
                "{:.0},{:.4},{:.4},{:.4},{:.3},{:.3},{:.3},{:.4},{:.4},{},{}\n",
                row.timestamp_ms,
                row.accel.x,
                row.accel.y,
                row.accel.z,
                row.jerk.x,
                row.jerk.y,
                row.jerk.magnitude,
                row.risk,
                row.z_accel,
                speed,
                row.event.csv_label(),
            ));
        }
        csv
    }

    /// Clears rows and recording state for session teardown.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.recording = false;
        self.dropped = 0;
    }
}

impl Default for SampleLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t_ms: f64, risk: f32) -> SampleRow {
        SampleRow {
            timestamp_ms: t_ms,
            accel: Vector3::new(0.1, -0.2, 0.05),
            jerk: JerkSample { x: 1.0, y: 2.0, z: 0.5, magnitude: 2.236 },
            risk,
            z_accel: 0.05,
            speed_mps: Some(13.9),
            event: SampleEvent::None,
        }
    }

    #[test]
    fn test_push_only_while_recording() {
        let mut log = SampleLog::new();
        log.push(row(0.0, 0.0));
        assert!(log.is_empty());

        log.start_recording();
        log.push(row(20.0, 0.1));
        assert_eq!(log.len(), 1);

        log.stop_recording();
        log.push(row(40.0, 0.2));
        assert_eq!(log.len(), 1, "rows after stop are ignored");
    }

    #[test]
    fn test_mark_event_tags_last_row() {
        let mut log = SampleLog::new();
        log.start_recording();
        log.push(row(0.0, 0.2));
        log.push(row(20.0, 0.95));
        log.mark_event(SampleEvent::Spill);
        assert_eq!(log.rows()[0].event, SampleEvent::None);
        assert_eq!(log.rows()[1].event, SampleEvent::Spill);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut log = SampleLog::new();
        log.start_recording();
        log.push(row(20.0, 0.5));
        log.mark_event(SampleEvent::Pothole);

        let csv = log.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp_ms,x,y,z,jerk_x,jerk_y,jerk_magnitude,risk,z_accel,speed_mps,event"
        );
        let data = lines.next().unwrap();
        assert!(data.starts_with("20,"));
        assert!(data.ends_with(",pothole"));
        assert!(data.contains("13.90"));
    }

    #[test]
    fn test_missing_speed_renders_empty_field() {
        let mut log = SampleLog::new();
        log.start_recording();
        let mut r = row(0.0, 0.0);
        r.speed_mps = None;
        log.push(r);
        let csv = log.to_csv();
        let data = csv.lines().nth(1).unwrap();
        assert!(data.ends_with(",,"), "empty speed then empty event");
    }

    #[test]
    fn test_row_cap_drops_overflow() {
        let mut log = SampleLog::with_capacity(2);
        log.start_recording();
        for i in 0..5 {
            log.push(row(i as f64 * 20.0, 0.0));
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 3);
    }

    #[test]
    fn test_start_recording_discards_previous_session() {
        let mut log = SampleLog::new();
        log.start_recording();
        log.push(row(0.0, 0.1));
        log.stop_recording();

        log.start_recording();
        assert!(log.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut log = SampleLog::new();
        log.start_recording();
        log.push(row(0.0, 0.1));
        log.reset();
        assert!(log.is_empty());
        assert!(!log.is_recording());
    }
}
