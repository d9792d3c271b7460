//! Replays captured IMU CSV logs through the tracker.
//!
//! Input is the logger firmware's serial CSV:
//! `timestamp_ms,accel_x_g,accel_y_g,accel_z_g,gyro_x_dps,gyro_y_dps,gyro_z_dps[,accel_mag_g,impact]`
//! with `#` comment lines, optionally gzip-compressed. Timestamps come
//! from the log, so a replay reproduces the live session exactly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use serde_json::json;

use spin_tracker_rs::types::ImuSample;
use spin_tracker_rs::{ShotConfig, SpinTracker, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Replay IMU capture logs through the spin tracker", long_about = None)]
struct Args {
    /// Path to a capture CSV (.csv or .csv.gz)
    #[arg(long, conflicts_with = "capture_dir")]
    log: Option<PathBuf>,

    /// Directory of captures to batch replay
    #[arg(long)]
    capture_dir: Option<PathBuf>,

    /// Impact trigger threshold in g (the standalone logger captured at 8 g)
    #[arg(long, default_value = "8.0")]
    trigger_g: f32,

    /// Cooldown between triggers in milliseconds
    #[arg(long, default_value = "200")]
    cooldown_ms: u32,

    /// Peak-tracking window in milliseconds
    #[arg(long, default_value = "100")]
    window_ms: u32,

    /// Shot log capacity
    #[arg(long, default_value = "256")]
    max_shots: usize,
}

fn open_reader(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn load_samples(path: &Path) -> anyhow::Result<Vec<ImuSample>> {
    let reader = BufReader::new(open_reader(path)?);
    let mut samples = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 7 {
            continue;
        }
        // Header row has a non-numeric first field
        let Ok(ts_ms) = fields[0].parse::<u64>() else {
            continue;
        };

        let mut values = [0.0f32; 6];
        let mut ok = true;
        for (slot, field) in values.iter_mut().zip(&fields[1..7]) {
            match field.parse::<f32>() {
                Ok(v) => *slot = v,
                Err(_) => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }

        samples.push(ImuSample {
            timestamp_us: (ts_ms * 1000) as u32,
            accel: (values[0], values[1], values[2]),
            gyro: (values[3], values[4], values[5]),
        });
    }

    Ok(samples)
}

fn run_once(path: &Path, args: &Args) -> anyhow::Result<serde_json::Value> {
    let samples = load_samples(path)?;
    anyhow::ensure!(!samples.is_empty(), "no samples parsed from {}", path.display());

    let mut tracker = SpinTracker::new(TrackerConfig {
        shot: ShotConfig {
            trigger_g: args.trigger_g,
            cooldown_ms: args.cooldown_ms,
            peak_window_ms: args.window_ms,
            max_events: args.max_shots,
        },
        ..TrackerConfig::default()
    });

    let mut max_rpm = 0.0f32;
    let mut max_g = 0.0f32;
    for sample in &samples {
        let update = tracker.update(sample);
        max_rpm = max_rpm.max(update.rpm);
        max_g = max_g.max(update.accel_mag_g);
    }

    let mut label_counts: HashMap<&'static str, u32> = HashMap::new();
    for shot in tracker.shots() {
        *label_counts.entry(shot.label.as_str()).or_insert(0) += 1;
    }

    let shots: Vec<_> = tracker
        .shots()
        .iter()
        .map(|s| {
            json!({
                "timestamp_us": s.timestamp_us,
                "peak_g": s.peak_g,
                "peak_rpm": s.peak_rpm,
                "gyro_dps": s.peak_gyro_dps,
                "label": s.label.as_str(),
            })
        })
        .collect();

    Ok(json!({
        "log": path.display().to_string(),
        "trigger_g": args.trigger_g,
        "samples": tracker.sample_count(),
        "shots": shots,
        "shot_count": tracker.shot_count(),
        "shots_dropped": tracker.shots_dropped(),
        "labels": label_counts,
        "max_rpm": max_rpm,
        "max_g": max_g,
        "final_quat_norm": tracker.orientation().norm(),
        "gyro_bias_rad_s": tracker.gyro_bias_rad_s(),
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut results = Vec::new();

    if let Some(dir) = args.capture_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !(name.ends_with(".csv") || name.ends_with(".csv.gz")) {
                continue;
            }
            match run_once(&path, &args) {
                Ok(res) => results.push(res),
                Err(e) => eprintln!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        results.push(run_once(log, &args)?);
    } else {
        anyhow::bail!("Provide --log or --capture-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
