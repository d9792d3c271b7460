use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use spin_tracker_rs::sensors;
use spin_tracker_rs::status::TrackerStatus;
use spin_tracker_rs::types::{ImuSample, ShotEvent, TrackerCommand};
use spin_tracker_rs::{ShotConfig, SpinTracker, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "spin_tracker")]
#[command(about = "Ball spin tracker - quaternion orientation + shot detection", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Impact trigger threshold in g
    #[arg(long, default_value = "4.0")]
    trigger_g: f32,

    /// Cooldown between triggers in milliseconds
    #[arg(long, default_value = "200")]
    cooldown_ms: u32,

    /// Peak-tracking window in milliseconds
    #[arg(long, default_value = "100")]
    window_ms: u32,

    /// Shot log capacity
    #[arg(long, default_value = "64")]
    max_shots: usize,

    /// Output directory
    #[arg(long, default_value = "spin_tracker_sessions")]
    output_dir: String,
}

#[derive(Serialize, Deserialize)]
struct SessionOutput {
    readings: Vec<ImuSample>,
    shots: Vec<ShotEvent>,
    stats: Stats,
}

#[derive(Serialize, Deserialize)]
struct Stats {
    total_samples: u64,
    total_shots: usize,
    shots_dropped: u64,
    max_rpm: f32,
    max_g: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("[{}] Spin Tracker Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Trigger: {:.1} g", args.trigger_g);
    println!("  Cooldown: {} ms, Window: {} ms", args.cooldown_ms, args.window_ms);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let mut tracker = SpinTracker::new(TrackerConfig {
        shot: ShotConfig {
            trigger_g: args.trigger_g,
            cooldown_ms: args.cooldown_ms,
            peak_window_ms: args.window_ms,
            max_events: args.max_shots,
        },
        ..TrackerConfig::default()
    });

    let (sample_tx, mut sample_rx) = mpsc::channel::<ImuSample>(500);
    let (command_tx, mut command_rx) = mpsc::channel::<TrackerCommand>(16);

    let _imu_handle = tokio::spawn(sensors::imu_loop(sample_tx));
    let _command_handle = tokio::spawn(sensors::command_loop(command_tx));

    let mut readings: Vec<ImuSample> = Vec::new();
    let mut max_rpm = 0.0f32;
    let mut max_g = 0.0f32;

    let start = Utc::now();
    let mut last_save = Utc::now();
    let mut last_status_update = Utc::now();

    println!("[{}] Tracking... (stdin commands: reset, clear)", ts_now());

    loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        // Drain control commands first so a reset lands before this tick's
        // samples are integrated.
        while let Ok(command) = command_rx.try_recv() {
            match command {
                TrackerCommand::ResetOrientation => {
                    tracker.reset_orientation();
                    println!("[{}] Orientation reset to identity", ts_now());
                }
                TrackerCommand::ClearShots => {
                    tracker.clear_shots();
                    println!("[{}] Shot log cleared", ts_now());
                }
            }
        }

        while let Ok(sample) = sample_rx.try_recv() {
            let update = tracker.update(&sample);
            readings.push(sample);

            max_rpm = max_rpm.max(update.rpm);
            max_g = max_g.max(update.accel_mag_g);

            if let Some(shot) = update.shot {
                println!(
                    "[{}] Shot #{}: {} peak {:.1} g / {:.0} rpm",
                    ts_now(),
                    tracker.shot_count(),
                    shot.label,
                    shot.peak_g,
                    shot.peak_rpm
                );
            }
        }

        let now = Utc::now();
        if (now.signed_duration_since(last_status_update).num_seconds() as u64) >= 2 {
            let status_path = format!("{}/live_status.json", args.output_dir);
            let _ = build_status(&tracker, start).save(&status_path);
            last_status_update = now;
        }

        if (now.signed_duration_since(last_save).num_seconds() as u64) >= 15 {
            let filename = format!("{}/session_{}.json", args.output_dir, ts_now_clean());
            save_session(&filename, &tracker, &readings, max_rpm, max_g)?;
            println!(
                "[{}] Auto-saved {} samples, {} shots to {}",
                ts_now(),
                readings.len(),
                tracker.shot_count(),
                filename
            );
            last_save = now;
        }

        sleep(Duration::from_millis(1)).await;
    }

    // Final save
    let filename = format!("{}/session_{}_final.json", args.output_dir, ts_now_clean());
    save_session(&filename, &tracker, &readings, max_rpm, max_g)?;
    println!(
        "[{}] Final save: {} samples, {} shots to {}",
        ts_now(),
        readings.len(),
        tracker.shot_count(),
        filename
    );

    let status_path = format!("{}/live_status_final.json", args.output_dir);
    let _ = build_status(&tracker, start).save(&status_path);

    println!("\n=== Final Stats ===");
    println!("Total samples: {}", tracker.sample_count());
    println!("Shots: {} ({} dropped)", tracker.shot_count(), tracker.shots_dropped());
    println!("Max spin: {:.0} rpm, max impact: {:.1} g", max_rpm, max_g);

    Ok(())
}

fn build_status(tracker: &SpinTracker, start: chrono::DateTime<Utc>) -> TrackerStatus {
    let mut status = TrackerStatus::new();
    status.samples = tracker.sample_count();
    status.shots_detected = tracker.shot_count() as u64;
    status.shots_dropped = tracker.shots_dropped();
    status.rpm = tracker.rpm();
    status.gyro_bias_rad_s = tracker.gyro_bias_rad_s();
    let q = tracker.orientation();
    status.orientation_wxyz = (q.w, q.i, q.j, q.k);
    status.peak_g = tracker
        .shots()
        .iter()
        .map(|s| s.peak_g)
        .fold(0.0, f32::max);
    status.uptime_seconds = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
    status
}

fn save_session(
    path: &str,
    tracker: &SpinTracker,
    readings: &[ImuSample],
    max_rpm: f32,
    max_g: f32,
) -> Result<()> {
    let output = SessionOutput {
        readings: readings.to_vec(),
        shots: tracker.shots().to_vec(),
        stats: Stats {
            total_samples: tracker.sample_count(),
            total_shots: tracker.shot_count(),
            shots_dropped: tracker.shots_dropped(),
            max_rpm,
            max_g,
        },
    };
    let json = serde_json::to_string_pretty(&output)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
