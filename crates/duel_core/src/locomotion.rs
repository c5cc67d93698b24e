//! Locomotion: turns a movement request into a displacement.
//!
//! - Requests inside the dead zone stop the agent
//! - Horizontal speed eases toward `move_speed × |request|`, reduced while
//!   reloading
//! - A dash forces the dash speed for its whole duration
//! - Gravity integrates while airborne, with a small hold-down when grounded

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;
use crate::math::{flatten, non_negative, normalize_or, UP};

/// Per-tick locomotion inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionInput {
    /// Smoothed movement request, magnitude ≤ 1.
    pub request: Vec3,
    /// Current facing, used as the dash direction without a request.
    pub forward: Vec3,
    /// A dash is in progress.
    pub dashing: bool,
    /// A reload is in progress.
    pub reloading: bool,
    /// The ground probe touched the floor.
    pub grounded: bool,
}

/// Speed state carried between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locomotion {
    config: MovementConfig,
    dash_speed: f32,
    horizontal_speed: f32,
    vertical_velocity: f32,
}

impl Locomotion {
    /// At rest.
    #[must_use]
    pub fn new(config: MovementConfig, dash_speed: f32) -> Self {
        Self {
            config,
            dash_speed,
            horizontal_speed: 0.0,
            vertical_velocity: 0.0,
        }
    }

    /// Current horizontal speed.
    #[must_use]
    pub fn horizontal_speed(&self) -> f32 {
        self.horizontal_speed
    }

    /// Current vertical velocity.
    #[must_use]
    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Displacement for this tick.
    pub fn step(&mut self, input: &MotionInput, dt: f32) -> Vec3 {
        let dt = non_negative(dt);
        let c = &self.config;
        let request = flatten(input.request);
        let magnitude = request.length().min(1.0);

        let direction;
        if input.dashing {
            direction = normalize_or(request, input.forward);
            self.horizontal_speed = self.dash_speed;
        } else {
            let target = if magnitude < c.dead_zone {
                0.0
            } else if input.reloading {
                c.move_speed * magnitude * (1.0 - c.reload_speed_penalty)
            } else {
                c.move_speed * magnitude
            };
            direction = if magnitude < c.dead_zone {
                Vec3::ZERO
            } else {
                normalize_or(request, Vec3::ZERO)
            };
            let t = (dt * c.speed_change_rate).min(1.0);
            let mut speed = self.horizontal_speed + (target - self.horizontal_speed) * t;
            if speed < c.min_speed {
                speed = 0.0;
            }
            self.horizontal_speed = non_negative(speed);
        }

        if input.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = c.grounded_velocity;
        } else {
            self.vertical_velocity =
                (self.vertical_velocity + c.gravity * dt).max(-c.terminal_velocity);
        }

        direction * self.horizontal_speed * dt + UP * self.vertical_velocity * dt
    }

    /// Correct the speed state to what the body actually achieved.
    pub fn observe(&mut self, actual: Vec3, dt: f32) {
        if dt <= 0.0 || !actual.is_finite() {
            return;
        }
        let achieved = flatten(actual).length() / dt;
        self.horizontal_speed = non_negative(self.horizontal_speed.min(achieved));
        if actual.y > self.vertical_velocity * dt && self.vertical_velocity < 0.0 {
            // Landed or blocked from below.
            self.vertical_velocity = (actual.y / dt).min(0.0);
        }
    }

    /// Back to rest.
    pub fn reset(&mut self) {
        self.horizontal_speed = 0.0;
        self.vertical_velocity = 0.0;
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.push(self.horizontal_speed.to_bits());
        bits.push(self.vertical_velocity.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(request: Vec3) -> MotionInput {
        MotionInput {
            request,
            forward: Vec3::Z,
            dashing: false,
            reloading: false,
            grounded: true,
        }
    }

    fn locomotion() -> Locomotion {
        Locomotion::new(MovementConfig::default(), 10.0)
    }

    #[test]
    fn test_speed_eases_toward_target() {
        let mut l = locomotion();
        l.step(&input(Vec3::Z), 0.02);
        assert!((l.horizontal_speed() - 1.0).abs() < 1e-5);
        for _ in 0..200 {
            l.step(&input(Vec3::Z), 0.02);
        }
        assert!((l.horizontal_speed() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_dead_zone_stops() {
        let mut l = locomotion();
        for _ in 0..200 {
            l.step(&input(Vec3::Z), 0.02);
        }
        let mut displacement = Vec3::ONE;
        for _ in 0..200 {
            displacement = l.step(&input(Vec3::new(0.1, 0.0, 0.0)), 0.02);
        }
        assert_eq!(l.horizontal_speed(), 0.0);
        assert_eq!(flatten(displacement), Vec3::ZERO);
    }

    #[test]
    fn test_idle_without_dead_zone_still_falls() {
        let config = MovementConfig {
            dead_zone: 0.0,
            ..MovementConfig::default()
        };
        let mut l = Locomotion::new(config, 10.0);
        let airborne = MotionInput {
            grounded: false,
            ..input(Vec3::ZERO)
        };
        let mut height = 0.0;
        for _ in 0..50 {
            let displacement = l.step(&airborne, 0.02);
            assert!(displacement.is_finite(), "{displacement:?}");
            assert_eq!(flatten(displacement), Vec3::ZERO);
            height += displacement.y;
        }
        assert!(height < -1.0, "fell only {height}");
    }

    #[test]
    fn test_reload_penalty_and_dash() {
        let mut l = locomotion();
        let mut reloading = input(Vec3::Z);
        reloading.reloading = true;
        for _ in 0..300 {
            l.step(&reloading, 0.02);
        }
        assert!((l.horizontal_speed() - 4.0).abs() < 1e-3);

        let mut dashing = input(Vec3::ZERO);
        dashing.dashing = true;
        dashing.reloading = true;
        let displacement = l.step(&dashing, 0.1);
        assert_eq!(l.horizontal_speed(), 10.0);
        assert!((flatten(displacement) - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_gravity_is_clamped() {
        let mut l = locomotion();
        let mut airborne = input(Vec3::ZERO);
        airborne.grounded = false;
        for _ in 0..1000 {
            l.step(&airborne, 0.02);
        }
        assert_eq!(l.vertical_velocity(), -53.0);
        let mut grounded = airborne;
        grounded.grounded = true;
        l.step(&grounded, 0.02);
        assert_eq!(l.vertical_velocity(), -2.0);
    }

    #[test]
    fn test_blocked_body_drops_speed() {
        let mut l = locomotion();
        for _ in 0..200 {
            l.step(&input(Vec3::Z), 0.02);
        }
        l.observe(Vec3::ZERO, 0.02);
        assert_eq!(l.horizontal_speed(), 0.0);
    }
}
