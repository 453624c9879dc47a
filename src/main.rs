//! Scripted demo drive.
//!
//! Plays a synthetic trip through a [`DriveSession`] (cruise, a harsh
//! swerve, a pothole strike, recovery, and a stop) and prints the
//! feedback stream plus the final score. Useful for eyeballing the
//! engine's behavior without a device.
//!
//! Run with `RUST_LOG=debug` to see drive-state transitions.

use cupcoach_core::session::{DriveSession, SessionConfig, SessionObserver, SessionSummary};
use cupcoach_core::types::{FeedbackSound, LocationFix, Vector3};

/// Prints every notification as it happens.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_sound(&mut self, sound: FeedbackSound) {
        println!("  ♪ {}", sound.asset_name());
    }

    fn on_drive_started(&mut self, started_at_ms: u64, manual: bool) {
        println!(
            "drive started at {started_at_ms} ms ({})",
            if manual { "manual" } else { "auto" }
        );
    }

    fn on_drive_ended(&mut self, summary: &SessionSummary) {
        println!(
            "drive ended: {:.1} min, {} spills, {} potholes",
            summary.duration_ms as f64 / 60_000.0,
            summary.spill_count,
            summary.pothole_count
        );
    }

    fn on_cooldown_change(&mut self, in_cooldown: bool) {
        if in_cooldown {
            println!("  (spill cooldown)");
        }
    }
}

fn main() {
    env_logger::init();

    let mut config = SessionConfig::default();
    config.record_samples = true;
    let mut session = DriveSession::new(config).expect("default config is valid");
    session.set_observer(Box::new(ConsoleObserver));

    println!("cupcoach demo drive (difficulty: {})", session.difficulty().as_str());

    // Sensors come up; the 1.5 s settling window absorbs the mount bump.
    session.start_sensors(0.0);
    let mut t_s = 0.0;
    for _ in 0..100 {
        session.handle_sample(Vector3::new(0.3, -0.2, 0.1), t_s);
        t_s += 0.02;
    }

    // GPS sees motion; the drive auto-starts after the 5 s debounce.
    let fixes: Vec<LocationFix> =
        (0..7).map(|i| LocationFix::new(i * 1_000, Some(13.0))).collect();
    session.handle_fixes(&fixes);

    // Calm cruise.
    for _ in 0..200 {
        session.handle_sample(Vector3::new(0.05, 0.02, 0.0), t_s);
        t_s += 0.02;
    }

    // A violent swerve: risk spikes and the cup goes over.
    println!("-- swerve --");
    for i in 0..50 {
        let accel = if i % 2 == 0 { 28.0 } else { -28.0 };
        session.handle_sample(Vector3::new(accel, 0.0, 0.0), t_s);
        session.ambient_tick(t_s * 1000.0);
        t_s += 0.02;
    }

    // Recovery, then a pothole strike.
    for _ in 0..200 {
        session.handle_sample(Vector3::ZERO, t_s);
        t_s += 0.02;
    }
    println!("-- pothole --");
    for _ in 0..2 {
        session.handle_sample(Vector3::new(0.0, 0.0, 16.0), t_s);
        t_s += 0.02;
    }
    for _ in 0..100 {
        session.handle_sample(Vector3::ZERO, t_s);
        t_s += 0.02;
    }

    // Park and stop the drive manually after twelve minutes of trip time.
    let summary = session
        .stop_manual(12 * 60 * 1_000)
        .expect("drive was active");

    println!();
    println!(
        "score: {} / 100{}",
        summary.score.score,
        if summary.score.is_perfect { "  PERFECT" } else { "" }
    );
    println!(
        "breakdown: base {} - spills {} + duration {} + perfect {}",
        summary.score.breakdown.base_score,
        summary.score.breakdown.spill_penalty,
        summary.score.breakdown.duration_bonus,
        summary.score.breakdown.perfect_bonus
    );
    println!("{} sample rows buffered for export", session.sample_count());
}
