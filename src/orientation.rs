//! Quaternion orientation integrator.
//!
//! Integrates body-frame angular velocity into a drift-limited attitude
//! estimate via the exponential map, renormalizing after every step.

use nalgebra::{Quaternion, Vector3};

/// Longest time step accepted as-is; anything larger (or non-positive) is
/// treated as a first-frame or overflow condition.
const MAX_DT_S: f32 = 0.1;

/// Nominal step substituted when the clamp triggers (~30 Hz cadence).
const FALLBACK_DT_S: f32 = 0.033;

/// Quaternion norms below this are considered degenerate; renormalization
/// is skipped rather than dividing by near-zero.
const MIN_QUAT_NORM: f32 = 1e-4;

pub struct OrientationTracker {
    quat: Quaternion<f32>,
    /// Angular rates below this magnitude (rad/s) are treated as exactly
    /// stationary to reject sensor noise.
    dead_zone_rad_s: f32,
}

impl OrientationTracker {
    pub fn new(dead_zone_rad_s: f32) -> Self {
        Self {
            quat: Quaternion::identity(),
            dead_zone_rad_s,
        }
    }

    /// Advance the orientation by one angular-velocity sample.
    ///
    /// `omega_rad_s` is the bias-corrected body-frame rate in rad/s;
    /// `dt_s` is the elapsed time since the previous call. Degenerate time
    /// steps are clamped to a nominal default instead of integrating a
    /// spurious rotation, and rates inside the dead zone leave the
    /// quaternion untouched.
    pub fn integrate(&mut self, omega_rad_s: Vector3<f32>, dt_s: f32) {
        let dt = if dt_s <= 0.0 || dt_s > MAX_DT_S {
            FALLBACK_DT_S
        } else {
            dt_s
        };

        let w = omega_rad_s.norm();
        if w < self.dead_zone_rad_s {
            return;
        }

        // Exponential map: incremental rotation about the rate axis.
        let half_angle = w * dt * 0.5;
        let (s, c) = half_angle.sin_cos();
        let axis = omega_rad_s / w;
        let delta = Quaternion::new(c, axis.x * s, axis.y * s, axis.z * s);

        // Delta is a body-frame rotation: right-multiply.
        let q = self.quat * delta;
        let norm = q.norm();
        if norm > MIN_QUAT_NORM {
            self.quat = Quaternion::new(q.w / norm, q.i / norm, q.j / norm, q.k / norm);
        }
    }

    /// Rotate a body-frame vector into the world frame.
    ///
    /// Cross-product form of the sandwich product `q v q⁻¹`: two cross
    /// products plus a scale-and-add instead of two full quaternion
    /// multiplies.
    pub fn rotate(&self, v: Vector3<f32>) -> Vector3<f32> {
        let u = Vector3::new(self.quat.i, self.quat.j, self.quat.k);
        let t = u.cross(&v) * 2.0;
        v + t * self.quat.w + u.cross(&t)
    }

    pub fn reset(&mut self) {
        self.quat = Quaternion::identity();
    }

    pub fn quaternion(&self) -> Quaternion<f32> {
        self.quat
    }

    pub fn quaternion_wxyz(&self) -> (f32, f32, f32, f32) {
        (self.quat.w, self.quat.i, self.quat.j, self.quat.k)
    }
}
