//! Exposure counters: how long since the agent last saw, shot at or hit its
//! opponent, and how long it has been hugging a wall.

use serde::{Deserialize, Serialize};

use crate::math::non_negative;

/// Elapsed-time counters feeding reward shaping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExposureCounters {
    /// Seconds since the opponent was last in line of sight.
    pub time_since_target_visible: f32,
    /// Seconds since the last shot left the muzzle.
    pub time_since_last_shot_fired: f32,
    /// Seconds since the last shot fired or hit landed.
    pub time_since_last_offensive_action: f32,
    /// Seconds of uninterrupted wall proximity.
    pub wall_proximity_time: f32,
}

impl ExposureCounters {
    /// Grow the elapsed-time counters by `dt`.
    pub fn advance(&mut self, dt: f32) {
        let dt = non_negative(dt);
        self.time_since_target_visible = non_negative(self.time_since_target_visible + dt);
        self.time_since_last_shot_fired = non_negative(self.time_since_last_shot_fired + dt);
        self.time_since_last_offensive_action =
            non_negative(self.time_since_last_offensive_action + dt);
    }

    /// Grow the wall timer while near a wall, reset it otherwise.
    pub fn observe_wall(&mut self, near_wall: bool, dt: f32) {
        self.wall_proximity_time = if near_wall {
            non_negative(self.wall_proximity_time + non_negative(dt))
        } else {
            0.0
        };
    }

    /// The opponent is in sight.
    pub fn on_target_visible(&mut self) {
        self.time_since_target_visible = 0.0;
    }

    /// A shot was fired.
    pub fn on_shot_fired(&mut self) {
        self.time_since_last_shot_fired = 0.0;
        self.time_since_last_offensive_action = 0.0;
    }

    /// A shot struck the opponent.
    pub fn on_hit_landed(&mut self) {
        self.time_since_last_offensive_action = 0.0;
    }

    /// Back to spawn defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.push(self.time_since_target_visible.to_bits());
        bits.push(self.time_since_last_shot_fired.to_bits());
        bits.push(self.time_since_last_offensive_action.to_bits());
        bits.push(self.wall_proximity_time.to_bits());
    }
}
