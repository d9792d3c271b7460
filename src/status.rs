use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of the tracker written out periodically so external tooling
/// can poll session health without attaching to the process.
#[derive(Serialize, Deserialize, Clone)]
pub struct TrackerStatus {
    pub timestamp: f64,
    pub samples: u64,
    pub shots_detected: u64,
    pub shots_dropped: u64,
    pub rpm: f32,
    pub gyro_dps: (f32, f32, f32),
    pub gyro_bias_rad_s: (f32, f32, f32),
    pub orientation_wxyz: (f32, f32, f32, f32),
    pub peak_g: f32,
    pub uptime_seconds: u64,
}

impl TrackerStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            samples: 0,
            shots_detected: 0,
            shots_dropped: 0,
            rpm: 0.0,
            gyro_dps: (0.0, 0.0, 0.0),
            gyro_bias_rad_s: (0.0, 0.0, 0.0),
            orientation_wxyz: (1.0, 0.0, 0.0, 0.0),
            peak_g: 0.0,
            uptime_seconds: 0,
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for TrackerStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
