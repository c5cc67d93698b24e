//! Movement request smoothing.
//!
//! A new request is adopted outright when it differs sharply from the held
//! one or once the hold time has run out; otherwise the output is blended
//! toward the held request. Lag is therefore bounded by the hold time.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SmoothingConfig;
use crate::math::{clamp_request, non_negative, vec3_bits};

/// Hold-and-blend filter for movement requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSmoother {
    config: SmoothingConfig,
    held: Vec3,
    elapsed: f32,
}

impl ActionSmoother {
    /// Smoother holding a zero request.
    #[must_use]
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            held: Vec3::ZERO,
            elapsed: 0.0,
        }
    }

    /// Currently held request.
    #[must_use]
    pub fn held(&self) -> Vec3 {
        self.held
    }

    /// Filter this tick's request.
    pub fn filter(&mut self, request: Vec3, dt: f32) -> Vec3 {
        let request = clamp_request(request);
        self.elapsed = non_negative(self.elapsed + non_negative(dt));
        if self.elapsed >= self.config.hold_time
            || (request - self.held).length() > self.config.change_threshold
        {
            self.held = request;
            self.elapsed = 0.0;
            request
        } else {
            clamp_request(request.lerp(self.held, self.config.blend))
        }
    }

    /// Drop the held request.
    pub fn reset(&mut self) {
        self.held = Vec3::ZERO;
        self.elapsed = 0.0;
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.extend(vec3_bits(self.held));
        bits.push(self.elapsed.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> ActionSmoother {
        ActionSmoother::new(SmoothingConfig::default())
    }

    #[test]
    fn test_sharp_change_is_immediate() {
        let mut s = smoother();
        let out = s.filter(Vec3::X, 0.02);
        assert_eq!(out, Vec3::X);
        assert_eq!(s.held(), Vec3::X);
    }

    #[test]
    fn test_small_change_is_blended() {
        let mut s = smoother();
        s.filter(Vec3::X, 0.02);
        let request = Vec3::new(0.8, 0.0, 0.2);
        let out = s.filter(request, 0.02);
        assert!((out - request.lerp(Vec3::X, 0.5)).length() < 1e-6);
        assert_eq!(s.held(), Vec3::X);
    }

    #[test]
    fn test_hold_time_bounds_lag() {
        let mut s = smoother();
        s.filter(Vec3::X, 0.02);
        let request = Vec3::new(0.8, 0.0, 0.2);
        let mut out = Vec3::ZERO;
        for _ in 0..5 {
            out = s.filter(request, 0.03);
        }
        assert_eq!(out, request);
        assert_eq!(s.held(), request);
    }

    #[test]
    fn test_output_magnitude_bounded() {
        let mut s = smoother();
        let out = s.filter(Vec3::new(10.0, 0.0, 0.0), 0.02);
        assert!(out.length() <= 1.0 + 1e-6);
    }
}
