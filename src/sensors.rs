//! Sample and command sources for the driver loop.
//!
//! Samples and control messages each arrive on their own mpsc queue and
//! are drained once per tick by the driver, so nothing mutates tracker
//! state from a callback.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::types::{ImuSample, TrackerCommand};

const SAMPLE_INTERVAL_MS: u64 = 5; // 200 Hz, matching the capture cadence

/// Synthetic IMU loop used when no hardware is attached.
///
/// Generates a quiet gravity baseline with a spin burst and impact spike
/// every ten seconds, which is enough to exercise the whole pipeline.
pub async fn imu_loop(tx: Sender<ImuSample>) {
    let mut ticker = interval(Duration::from_millis(SAMPLE_INTERVAL_MS));
    let mut sample_count = 0u64;

    loop {
        ticker.tick().await;

        let sample = mock_sample(sample_count);
        match tx.try_send(sample) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 1000 == 0 {
                    eprintln!("[IMU] {} samples", sample_count);
                }
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                eprintln!("[IMU] Channel closed after {} samples", sample_count);
                break;
            }
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                // Channel full, drop this sample
            }
        }
    }
}

/// Reads control commands from stdin, one per line.
pub async fn command_loop(tx: Sender<TrackerCommand>) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let command = match line.trim() {
            "reset" => TrackerCommand::ResetOrientation,
            "clear" => TrackerCommand::ClearShots,
            "" => continue,
            other => {
                eprintln!("[CMD] Unknown command: {}", other);
                continue;
            }
        };
        if tx.send(command).await.is_err() {
            break;
        }
    }
}

fn mock_sample(n: u64) -> ImuSample {
    let t = n as f32 * (SAMPLE_INTERVAL_MS as f32 / 1000.0);
    let phase = t % 10.0;

    // Spin burst between t=5s and t=6s of each cycle, spike at its start
    let (accel, gyro) = if (5.0..6.0).contains(&phase) {
        let spike = if phase < 5.02 { 6.5 } else { 0.4 };
        let gyro = (
            540.0 * (phase * 3.0).sin().abs() + 120.0,
            90.0 * (phase * 2.0).cos(),
            30.0,
        );
        ((spike, 0.3, 0.5), gyro)
    } else {
        (
            (
                0.02 * (t * 2.1).sin(),
                0.02 * (t * 1.7).cos(),
                1.0 + 0.01 * t.sin(),
            ),
            (
                0.4 * (t * 0.9).sin(),
                0.3 * (t * 1.3).cos(),
                0.2 * t.sin(),
            ),
        )
    };

    ImuSample {
        timestamp_us: (n * SAMPLE_INTERVAL_MS * 1000) as u32,
        accel,
        gyro,
    }
}
