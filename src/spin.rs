//! Smoothed spin-rate and per-axis gyro filter.
//!
//! Single-pole IIR smoothing for display and telemetry, decoupled from the
//! integrator's noise-rejecting dead zone. Approximate by design: this is
//! exponential smoothing, not a Kalman filter, and only converges toward
//! the true signal as samples accumulate.

use nalgebra::Vector3;

use crate::types::DPS_TO_RPM;

pub struct SpinFilter {
    gyro_dps: Vector3<f32>,
    rpm: f32,
    axis_alpha: f32,
    rpm_alpha: f32,
}

impl SpinFilter {
    pub fn new(axis_alpha: f32, rpm_alpha: f32) -> Self {
        Self {
            gyro_dps: Vector3::zeros(),
            rpm: 0.0,
            axis_alpha,
            rpm_alpha,
        }
    }

    /// Feed one raw gyro sample in deg/s.
    pub fn update(&mut self, raw_dps: Vector3<f32>) {
        self.gyro_dps += (raw_dps - self.gyro_dps) * self.axis_alpha;

        let raw_rpm = raw_dps.norm() * DPS_TO_RPM;
        self.rpm += (raw_rpm - self.rpm) * self.rpm_alpha;
    }

    /// Smoothed per-axis angular velocity in deg/s.
    pub fn gyro_dps(&self) -> Vector3<f32> {
        self.gyro_dps
    }

    /// Smoothed scalar spin rate (RPM-like).
    pub fn rpm(&self) -> f32 {
        self.rpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filter() -> SpinFilter {
        SpinFilter::new(0.15, 0.08)
    }

    #[test]
    fn test_starts_at_rest() {
        let f = filter();
        assert_eq!(f.gyro_dps(), Vector3::zeros());
        assert_eq!(f.rpm(), 0.0);
    }

    #[test]
    fn test_axes_converge_to_constant_input() {
        let mut f = filter();
        let raw = Vector3::new(300.0, -120.0, 60.0);
        for _ in 0..200 {
            f.update(raw);
        }
        assert_relative_eq!(f.gyro_dps().x, 300.0, epsilon = 0.01);
        assert_relative_eq!(f.gyro_dps().y, -120.0, epsilon = 0.01);
        assert_relative_eq!(f.gyro_dps().z, 60.0, epsilon = 0.01);
    }

    #[test]
    fn test_rpm_scale_factor() {
        let mut f = filter();
        // |gyro| = 600 deg/s -> 100 on the RPM-like scale
        let raw = Vector3::new(600.0, 0.0, 0.0);
        for _ in 0..400 {
            f.update(raw);
        }
        assert_relative_eq!(f.rpm(), 100.0, epsilon = 0.1);
    }

    #[test]
    fn test_rpm_lags_axis_filter() {
        let mut f = filter();
        let raw = Vector3::new(600.0, 0.0, 0.0);
        f.update(raw);
        // One step: axis at 15% of input, rpm only at 8%
        assert_relative_eq!(f.gyro_dps().x, 90.0, epsilon = 0.01);
        assert_relative_eq!(f.rpm(), 8.0, epsilon = 0.01);
    }
}
