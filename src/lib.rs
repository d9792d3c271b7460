//! Orientation and motion-event tracking for a ball-mounted IMU.
//!
//! Consumes timestamped accelerometer/gyro samples, maintains a
//! drift-limited quaternion orientation, smooths spin rate for telemetry,
//! and detects and classifies discrete impact events.

pub mod bias;
pub mod orientation;
pub mod sensors;
pub mod shot;
pub mod spin;
pub mod status;
pub mod tracker;
pub mod types;

pub use shot::{classify, ShotConfig, ShotDetector};
pub use tracker::{SpinTracker, TrackerConfig, TrackerUpdate};
pub use types::{ImuSample, ShotEvent, SpinLabel, TrackerCommand};
