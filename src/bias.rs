//! Gyro zero-rate bias estimator.
//!
//! Learns the sensor's zero-rate offset while the device looks stationary so
//! that long quiet periods do not accumulate orientation drift.

use nalgebra::Vector3;

pub struct GyroBiasEstimator {
    bias: Vector3<f32>,
    /// Raw-rate magnitude (rad/s) below which the device is judged
    /// stationary and learning is allowed.
    stationary_thresh_rad_s: f32,
    /// EMA learning rate; deliberately small so genuine slow spin is never
    /// absorbed into the bias.
    learning_rate: f32,
}

impl GyroBiasEstimator {
    pub fn new(stationary_thresh_rad_s: f32, learning_rate: f32) -> Self {
        Self {
            bias: Vector3::zeros(),
            stationary_thresh_rad_s,
            learning_rate,
        }
    }

    /// Observe one raw (pre-correction) angular velocity in rad/s.
    ///
    /// Each call moves the bias by at most `learning_rate * |raw - bias|`;
    /// it never jumps discontinuously. Above the stationary threshold the
    /// estimate is left unchanged.
    pub fn update(&mut self, raw_rad_s: Vector3<f32>) {
        if raw_rad_s.norm() < self.stationary_thresh_rad_s {
            self.bias += (raw_rad_s - self.bias) * self.learning_rate;
        }
    }

    /// Bias-corrected angular velocity fed to the integrator.
    pub fn correct(&self, raw_rad_s: Vector3<f32>) -> Vector3<f32> {
        raw_rad_s - self.bias
    }

    pub fn bias(&self) -> Vector3<f32> {
        self.bias
    }
}
