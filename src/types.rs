//! Shared sample and event types for the spin tracker.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Empirical scale factor from |gyro| in deg/s to an RPM-like spin rate.
pub const DPS_TO_RPM: f32 = 1.0 / 6.0;

pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// One 6-axis IMU reading.
///
/// Timestamps are monotonic microseconds as reported by the sampler and
/// strictly increase across a session. Acceleration is in g, angular
/// velocity in deg/s (sensor-native units).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ImuSample {
    pub timestamp_us: u32,
    pub accel: (f32, f32, f32),
    pub gyro: (f32, f32, f32),
}

impl ImuSample {
    pub fn accel_vec(&self) -> Vector3<f32> {
        Vector3::new(self.accel.0, self.accel.1, self.accel.2)
    }

    pub fn gyro_dps(&self) -> Vector3<f32> {
        Vector3::new(self.gyro.0, self.gyro.1, self.gyro.2)
    }

    pub fn gyro_rad(&self) -> Vector3<f32> {
        self.gyro_dps() * DEG_TO_RAD
    }

    /// Total acceleration magnitude in g.
    pub fn accel_mag_g(&self) -> f32 {
        self.accel_vec().norm()
    }
}

/// Spin classification for a finalized shot.
///
/// Hard-threshold, single-dominant-axis labels with no hysteresis; motion
/// hovering near a ratio boundary can flicker between labels across
/// consecutive shots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpinLabel {
    Flat,
    Topspin,
    Backspin,
    SideR,
    SideL,
    Slice,
    Mixed,
}

impl SpinLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinLabel::Flat => "FLAT",
            SpinLabel::Topspin => "TOPSPIN",
            SpinLabel::Backspin => "BACKSPIN",
            SpinLabel::SideR => "SIDE_R",
            SpinLabel::SideL => "SIDE_L",
            SpinLabel::Slice => "SLICE",
            SpinLabel::Mixed => "MIXED",
        }
    }
}

impl std::fmt::Display for SpinLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized impact event. Immutable once recorded.
///
/// Peak fields are running maxima over the whole tracking window, not the
/// values at trigger time. The gyro vector keeps the sample that maximized
/// the sum of absolute components.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShotEvent {
    pub timestamp_us: u32,
    pub peak_g: f32,
    pub peak_rpm: f32,
    pub peak_gyro_dps: (f32, f32, f32),
    pub label: SpinLabel,
}

/// Control messages delivered to the driver loop via the command queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerCommand {
    ResetOrientation,
    ClearShots,
}
