//! Kinematic character body.
//!
//! An upright cylinder that resolves horizontal motion one axis at a time,
//! so a body pushed diagonally into a wall slides along it instead of
//! stopping dead. Only walls block; agent bodies pass through each other.

use std::sync::Arc;

use duel_core::body::{MotionBody, Pose};
use duel_core::shapes::Aabb;
use glam::Vec3;

/// Sliding body for one agent.
#[derive(Debug, Clone)]
pub struct SlideBody {
    walls: Arc<[Aabb]>,
    radius: f32,
    height: f32,
    floor: f32,
    collision_enabled: bool,
}

impl SlideBody {
    /// Body of the given size among `walls`, standing on a floor at `y = 0`.
    #[must_use]
    pub fn new(walls: Arc<[Aabb]>, radius: f32, height: f32) -> Self {
        Self {
            walls,
            radius,
            height,
            floor: 0.0,
            collision_enabled: true,
        }
    }

    /// Body radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Body height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Whether collision response is active.
    #[must_use]
    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    fn touches(&self, wall: &Aabb, feet: Vec3) -> bool {
        let closest_x = feet.x.clamp(wall.min.x, wall.max.x);
        let closest_z = feet.z.clamp(wall.min.z, wall.max.z);
        let dx = feet.x - closest_x;
        let dz = feet.z - closest_z;
        let overlaps_plan = dx * dx + dz * dz < self.radius * self.radius;
        let overlaps_height = feet.y < wall.max.y && feet.y + self.height > wall.min.y;
        overlaps_plan && overlaps_height
    }

    /// A wall blocks a move if it touches the target but not the start, so a
    /// body that begins inside a wall can still walk out.
    fn blocked(&self, from: Vec3, to: Vec3) -> bool {
        self.walls
            .iter()
            .any(|wall| self.touches(wall, to) && !self.touches(wall, from))
    }
}

impl MotionBody for SlideBody {
    fn move_by(&mut self, from: Vec3, displacement: Vec3) -> Vec3 {
        if !self.collision_enabled {
            return from + displacement;
        }

        let mut position = from;

        let along_x = position + Vec3::new(displacement.x, 0.0, 0.0);
        if !self.blocked(position, along_x) {
            position = along_x;
        }
        let along_z = position + Vec3::new(0.0, 0.0, displacement.z);
        if !self.blocked(position, along_z) {
            position = along_z;
        }

        position.y = (position.y + displacement.y).max(self.floor);
        position
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }

    fn teleport(&mut self, pose: Pose) {
        tracing::trace!(x = pose.position.x, z = pose.position.z, "Body teleported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(walls: Vec<Aabb>) -> SlideBody {
        SlideBody::new(walls.into(), 0.5, 1.8)
    }

    fn east_wall() -> Aabb {
        Aabb::new(Vec3::new(2.0, 0.0, -5.0), Vec3::new(3.0, 3.0, 5.0))
    }

    #[test]
    fn test_free_motion() {
        let mut body = body_with(vec![]);
        let to = body.move_by(Vec3::ZERO, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(to, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_wall_blocks_and_slides() {
        let mut body = body_with(vec![east_wall()]);
        let to = body.move_by(Vec3::new(1.4, 0.0, 0.0), Vec3::new(0.3, 0.0, 0.3));
        assert_eq!(to.x, 1.4, "x blocked by the wall");
        assert!((to.z - 0.3).abs() < 1e-6, "z slides along it");
    }

    #[test]
    fn test_floor_clamp() {
        let mut body = body_with(vec![]);
        let to = body.move_by(Vec3::new(0.0, 0.05, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(to.y, 0.0);
    }

    #[test]
    fn test_disabled_collision_passes_through() {
        let mut body = body_with(vec![east_wall()]);
        body.set_collision_enabled(false);
        let to = body.move_by(Vec3::new(1.4, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(to.x, 3.4);
        body.set_collision_enabled(true);
        assert!(body.collision_enabled());
    }

    #[test]
    fn test_body_inside_wall_can_leave() {
        let mut body = body_with(vec![east_wall()]);
        let to = body.move_by(Vec3::new(2.2, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!((to.x - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_low_wall_is_stepped_over_only_if_above() {
        let curb = Aabb::new(Vec3::new(1.0, 0.0, -1.0), Vec3::new(2.0, 0.5, 1.0));
        let mut body = body_with(vec![curb]);
        let blocked = body.move_by(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(blocked.x, 0.0);
        let above = body.move_by(Vec3::new(0.0, 0.6, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(above.x, 1.0);
    }
}
