//! Observation vector for learned policies.
//!
//! Layout (default 8 wall rays, 26 floats):
//!
//! | index | value |
//! |---|---|
//! | 0..3 | position |
//! | 3..6 | facing |
//! | 6..9 | opponent position (zeros without opponent) |
//! | 9..12 | direction to opponent (zeros without opponent) |
//! | 12 | can fire |
//! | 13 | reloading |
//! | 14 | dashing |
//! | 15 | dash cooldown fraction |
//! | 16..24 | wall-only ray distances, normalized |
//! | 24 | opponent distance over detection range (1 without opponent) |
//! | 25 | aim alignment (0 without opponent) |

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Observation length with the default ray count.
pub const OBSERVATION_LEN: usize = 26;

/// Floats in the observation besides the wall rays.
pub const FIXED_FIELDS: usize = 18;

/// Structured observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Agent position.
    pub position: Vec3,
    /// Agent facing.
    pub forward: Vec3,
    /// Opponent position, if resolved.
    pub opponent_position: Option<Vec3>,
    /// Direction to the opponent, if resolved.
    pub opponent_direction: Option<Vec3>,
    /// Weapon loaded.
    pub can_fire: bool,
    /// Reload running.
    pub reloading: bool,
    /// Dash running.
    pub dashing: bool,
    /// Fraction of the dash cooldown remaining.
    pub dash_cooldown: f32,
    /// Wall-only ray distances on a full circle.
    pub wall_rays: Vec<f32>,
    /// Opponent distance over detection range, clamped to `[0, 1]`.
    pub opponent_distance: f32,
    /// Dot product of facing and direction to the opponent.
    pub aim_alignment: f32,
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Observation {
    /// Number of floats in [`Observation::to_vec`].
    #[must_use]
    pub fn len(&self) -> usize {
        FIXED_FIELDS + self.wall_rays.len()
    }

    /// Whether the vector would be empty (never).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Flatten in the documented order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.position.to_array());
        out.extend(self.forward.to_array());
        out.extend(self.opponent_position.unwrap_or(Vec3::ZERO).to_array());
        out.extend(self.opponent_direction.unwrap_or(Vec3::ZERO).to_array());
        out.push(flag(self.can_fire));
        out.push(flag(self.reloading));
        out.push(flag(self.dashing));
        out.push(self.dash_cooldown);
        out.extend(&self.wall_rays);
        out.push(self.opponent_distance);
        out.push(self.aim_alignment);
        out.into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect()
    }
}
