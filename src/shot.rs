//! Impact detection and spin classification.
//!
//! A trigger-threshold crossing opens a peak-tracking window; when the
//! window expires the running maxima are classified and recorded. A
//! cooldown relative to the trigger timestamp gates re-arming, so all
//! timing is derived from sample timestamps and replays deterministically.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::types::{ShotEvent, SpinLabel};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShotConfig {
    /// Acceleration magnitude (g) that opens a candidate event. Capture
    /// profiles differ: 4 g for live streaming, 8 g for the standalone
    /// logger, so this is configuration rather than a constant.
    pub trigger_g: f32,
    /// Minimum spacing between triggers, measured from the previous
    /// trigger timestamp.
    pub cooldown_ms: u32,
    /// How long peak fields keep accumulating after the trigger.
    pub peak_window_ms: u32,
    /// Event log capacity. Overflow policy is reject-new: once full,
    /// further events are dropped and only the count reveals saturation.
    pub max_events: usize,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            trigger_g: 4.0,
            cooldown_ms: 200,
            peak_window_ms: 100,
            max_events: 64,
        }
    }
}

struct PendingShot {
    trigger_us: u32,
    peak_g: f32,
    peak_rpm: f32,
    peak_gyro_dps: Vector3<f32>,
}

pub struct ShotDetector {
    config: ShotConfig,
    pending: Option<PendingShot>,
    last_trigger_us: Option<u32>,
    events: Vec<ShotEvent>,
    dropped: u64,
}

impl ShotDetector {
    pub fn new(config: ShotConfig) -> Self {
        Self {
            config,
            pending: None,
            last_trigger_us: None,
            events: Vec::with_capacity(config.max_events),
            dropped: 0,
        }
    }

    /// Advance the detector by one sample.
    ///
    /// `gyro_dps` and `rpm` are the smoothed values from the spin filter,
    /// matching what gets reported on the finalized event. Returns the
    /// event when this sample closed a tracking window.
    pub fn update(
        &mut self,
        timestamp_us: u32,
        accel_mag_g: f32,
        gyro_dps: Vector3<f32>,
        rpm: f32,
    ) -> Option<ShotEvent> {
        if let Some(mut pending) = self.pending.take() {
            let elapsed_us = timestamp_us.wrapping_sub(pending.trigger_us);
            if elapsed_us < self.config.peak_window_ms * 1000 {
                // Running maxima across the whole window, not a latch of
                // the trigger-time sample.
                pending.peak_g = pending.peak_g.max(accel_mag_g);
                pending.peak_rpm = pending.peak_rpm.max(rpm);
                if abs_sum(gyro_dps) > abs_sum(pending.peak_gyro_dps) {
                    pending.peak_gyro_dps = gyro_dps;
                }
                self.pending = Some(pending);
                return None;
            }
            return Some(self.finalize(pending));
        }

        let cooled_down = self
            .last_trigger_us
            .map(|t| timestamp_us.wrapping_sub(t) >= self.config.cooldown_ms * 1000)
            .unwrap_or(true);

        if accel_mag_g > self.config.trigger_g && cooled_down {
            log::debug!(
                "shot candidate opened at {} us ({:.1} g)",
                timestamp_us,
                accel_mag_g
            );
            self.last_trigger_us = Some(timestamp_us);
            self.pending = Some(PendingShot {
                trigger_us: timestamp_us,
                peak_g: accel_mag_g,
                peak_rpm: rpm,
                peak_gyro_dps: gyro_dps,
            });
        }
        None
    }

    fn finalize(&mut self, pending: PendingShot) -> ShotEvent {
        let g = pending.peak_gyro_dps;
        let event = ShotEvent {
            timestamp_us: pending.trigger_us,
            peak_g: pending.peak_g,
            peak_rpm: pending.peak_rpm,
            peak_gyro_dps: (g.x, g.y, g.z),
            label: classify(g.x, g.y, g.z, pending.peak_rpm),
        };

        if self.events.len() < self.config.max_events {
            self.events.push(event.clone());
            log::info!(
                "shot #{}: {} peak {:.1} g / {:.0} rpm",
                self.events.len(),
                event.label,
                event.peak_g,
                event.peak_rpm
            );
        } else {
            self.dropped += 1;
            log::warn!("shot log full ({} events), dropping", self.config.max_events);
        }
        event
    }

    pub fn events(&self) -> &[ShotEvent] {
        &self.events
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Events finalized after the log filled up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}

fn abs_sum(v: Vector3<f32>) -> f32 {
    v.x.abs() + v.y.abs() + v.z.abs()
}

/// Classify a shot from its peak gyro vector (deg/s) and peak spin rate.
///
/// Dominant-axis ratios with a hard 0.5 cutoff; slow or gyro-silent
/// impacts fall through to FLAT.
pub fn classify(gx: f32, gy: f32, gz: f32, rpm: f32) -> SpinLabel {
    if rpm < 5.0 {
        return SpinLabel::Flat;
    }
    let total = gx.abs() + gy.abs() + gz.abs();
    if total < 1.0 {
        return SpinLabel::Flat;
    }
    let rx = gx.abs() / total;
    let ry = gy.abs() / total;
    let rz = gz.abs() / total;

    if rx > 0.5 {
        if gx > 0.0 {
            SpinLabel::Topspin
        } else {
            SpinLabel::Backspin
        }
    } else if ry > 0.5 {
        if gy > 0.0 {
            SpinLabel::SideR
        } else {
            SpinLabel::SideL
        }
    } else if rz > 0.5 {
        SpinLabel::Slice
    } else {
        SpinLabel::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u32 = 1000;

    fn detector() -> ShotDetector {
        ShotDetector::new(ShotConfig::default())
    }

    fn quiet(d: &mut ShotDetector, ts_us: u32) -> Option<ShotEvent> {
        d.update(ts_us, 1.0, Vector3::zeros(), 0.0)
    }

    #[test]
    fn test_peak_tracking_keeps_window_maximum() {
        let mut d = detector();
        assert!(d.update(0, 5.0, Vector3::zeros(), 0.0).is_none());
        assert!(d.update(10 * MS, 9.0, Vector3::zeros(), 0.0).is_none());
        assert!(d.update(20 * MS, 6.0, Vector3::zeros(), 0.0).is_none());
        let event = quiet(&mut d, 120 * MS).expect("window should close");
        assert_eq!(event.peak_g, 9.0);
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn test_gyro_peak_uses_abs_sum_key() {
        let mut d = detector();
        d.update(0, 5.0, Vector3::new(25.0, 0.0, 0.0), 10.0);
        // Sum of abs components 30 beats 25 even though no single axis does
        d.update(10 * MS, 4.5, Vector3::new(10.0, 10.0, 10.0), 10.0);
        let event = quiet(&mut d, 120 * MS).unwrap();
        assert_eq!(event.peak_gyro_dps, (10.0, 10.0, 10.0));
    }

    #[test]
    fn test_cooldown_merges_close_spikes() {
        let mut d = detector();
        d.update(0, 5.0, Vector3::zeros(), 0.0);
        quiet(&mut d, 120 * MS);
        // 150 ms after the first trigger: inside the 200 ms cooldown
        d.update(150 * MS, 6.0, Vector3::zeros(), 0.0);
        quiet(&mut d, 300 * MS);
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn test_spikes_outside_cooldown_both_record() {
        let mut d = detector();
        d.update(0, 5.0, Vector3::zeros(), 0.0);
        quiet(&mut d, 120 * MS);
        d.update(250 * MS, 6.0, Vector3::zeros(), 0.0);
        quiet(&mut d, 400 * MS);
        assert_eq!(d.count(), 2);
    }

    #[test]
    fn test_capacity_bound_rejects_new() {
        let mut d = ShotDetector::new(ShotConfig {
            max_events: 2,
            cooldown_ms: 0,
            ..ShotConfig::default()
        });
        let mut ts = 0u32;
        for i in 0..4 {
            d.update(ts, 5.0 + i as f32, Vector3::zeros(), 0.0);
            ts += 120 * MS;
            quiet(&mut d, ts);
            ts += 10 * MS;
        }
        assert_eq!(d.count(), 2);
        assert_eq!(d.dropped(), 2);
        // Oldest events are kept, not overwritten
        assert_eq!(d.events()[0].peak_g, 5.0);
    }

    #[test]
    fn test_clear_resets_log() {
        let mut d = detector();
        d.update(0, 5.0, Vector3::zeros(), 0.0);
        quiet(&mut d, 120 * MS);
        assert_eq!(d.count(), 1);
        d.clear();
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn test_classify_dominant_axes() {
        assert_eq!(classify(50.0, 0.0, 0.0, 10.0), SpinLabel::Topspin);
        assert_eq!(classify(-50.0, 0.0, 0.0, 10.0), SpinLabel::Backspin);
        assert_eq!(classify(0.0, 50.0, 0.0, 10.0), SpinLabel::SideR);
        assert_eq!(classify(0.0, -50.0, 0.0, 10.0), SpinLabel::SideL);
        assert_eq!(classify(0.0, 0.0, 50.0, 10.0), SpinLabel::Slice);
        assert_eq!(classify(0.0, 0.0, -50.0, 10.0), SpinLabel::Slice);
    }

    #[test]
    fn test_classify_flat_and_mixed() {
        // Slow spin is FLAT regardless of gyro values
        assert_eq!(classify(100.0, 0.0, 0.0, 4.9), SpinLabel::Flat);
        // Gyro-silent impact is FLAT
        assert_eq!(classify(0.0, 0.0, 0.0, 10.0), SpinLabel::Flat);
        // Each axis ratio 1/3: no dominant axis
        assert_eq!(classify(10.0, 10.0, 10.0, 10.0), SpinLabel::Mixed);
    }
}
