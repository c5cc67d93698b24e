//! Physical body seam.
//!
//! The agent decides where it wants to go; a [`MotionBody`] decides where it
//! actually ends up. Collision resolution, sliding and step-up all belong to
//! the host.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::{normalize_or, vec3_bits};

/// Position and facing of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Feet position.
    pub position: Vec3,
    /// Horizontal unit facing direction.
    pub forward: Vec3,
}

impl Pose {
    /// Pose with the facing flattened and normalized (defaults to +Z).
    #[must_use]
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: normalize_or(Vec3::new(forward.x, 0.0, forward.z), Vec3::Z),
        }
    }

    /// Bit pattern used for state hashing.
    #[must_use]
    pub fn bits(&self) -> [u32; 6] {
        let p = vec3_bits(self.position);
        let f = vec3_bits(self.forward);
        [p[0], p[1], p[2], f[0], f[1], f[2]]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

/// Host-side kinematic body.
pub trait MotionBody {
    /// Move from `from` by `displacement`, returning the resolved position.
    fn move_by(&mut self, from: Vec3, displacement: Vec3) -> Vec3;

    /// Enable or disable collision response for this body.
    fn set_collision_enabled(&mut self, enabled: bool);

    /// Write a pose directly, bypassing collision.
    fn teleport(&mut self, pose: Pose);
}

/// Body that applies every displacement unobstructed except by a flat floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeBody {
    /// Floor height the body cannot sink below.
    pub floor: Option<f32>,
    /// Whether collision response is active.
    pub collision_enabled: bool,
    /// Last pose written through [`MotionBody::teleport`].
    pub last_teleport: Option<Pose>,
}

impl Default for FreeBody {
    fn default() -> Self {
        Self {
            floor: Some(0.0),
            collision_enabled: true,
            last_teleport: None,
        }
    }
}

impl MotionBody for FreeBody {
    fn move_by(&mut self, from: Vec3, displacement: Vec3) -> Vec3 {
        let mut to = from + displacement;
        if let Some(floor) = self.floor {
            if self.collision_enabled && to.y < floor {
                to.y = floor;
            }
        }
        to
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }

    fn teleport(&mut self, pose: Pose) {
        self.last_teleport = Some(pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_body_stops_at_floor() {
        let mut body = FreeBody::default();
        let to = body.move_by(Vec3::new(0.0, 0.1, 0.0), Vec3::new(1.0, -0.5, 0.0));
        assert_eq!(to, Vec3::new(1.0, 0.0, 0.0));

        body.set_collision_enabled(false);
        let to = body.move_by(Vec3::ZERO, Vec3::new(0.0, -0.5, 0.0));
        assert!(to.y < 0.0);
    }

    #[test]
    fn test_pose_flattens_forward() {
        let pose = Pose::new(Vec3::ZERO, Vec3::new(0.0, 5.0, 2.0));
        assert_eq!(pose.forward, Vec3::Z);
        assert_eq!(Pose::new(Vec3::ZERO, Vec3::Y).forward, Vec3::Z);
    }
}
