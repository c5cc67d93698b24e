//! Arena layout.
//!
//! A square floor at `y = 0`, fenced by four boundary walls, with any number
//! of box obstacles inside. Layouts are plain data so scenarios can describe
//! them in RON.

use duel_core::shapes::{Aabb, ColliderSet};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Static geometry of a duel arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLayout {
    /// Distance from the centre to the inner face of each boundary wall.
    pub half_size: f32,
    /// Boundary wall height.
    pub wall_height: f32,
    /// Boundary wall thickness.
    pub wall_thickness: f32,
    /// Obstacles inside the boundary.
    pub obstacles: Vec<Aabb>,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::training()
    }
}

impl ArenaLayout {
    /// 20 x 20 arena with a 3 x 3 block in the middle.
    #[must_use]
    pub fn training() -> Self {
        Self {
            half_size: 10.0,
            wall_height: 3.0,
            wall_thickness: 0.5,
            obstacles: vec![Aabb::from_center(
                Vec3::new(0.0, 1.5, 0.0),
                Vec3::new(1.5, 1.5, 1.5),
            )],
        }
    }

    /// Fenced arena with nothing inside.
    #[must_use]
    pub fn open(half_size: f32) -> Self {
        Self {
            half_size,
            obstacles: Vec::new(),
            ..Self::training()
        }
    }

    /// Add an obstacle.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Aabb) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// The four boundary walls (north, south, east, west).
    #[must_use]
    pub fn boundary(&self) -> [Aabb; 4] {
        let h = self.half_size;
        let t = self.wall_thickness;
        let y = self.wall_height;
        [
            Aabb::new(Vec3::new(-h - t, 0.0, h), Vec3::new(h + t, y, h + t)),
            Aabb::new(Vec3::new(-h - t, 0.0, -h - t), Vec3::new(h + t, y, -h)),
            Aabb::new(Vec3::new(h, 0.0, -h), Vec3::new(h + t, y, h)),
            Aabb::new(Vec3::new(-h - t, 0.0, -h), Vec3::new(-h, y, h)),
        ]
    }

    /// Boundary walls followed by obstacles.
    #[must_use]
    pub fn walls(&self) -> Vec<Aabb> {
        let mut walls = self.boundary().to_vec();
        walls.extend(self.obstacles.iter().copied());
        walls
    }

    /// Colliders for the arena with a floor and no agents yet.
    #[must_use]
    pub fn colliders(&self) -> ColliderSet {
        self.walls()
            .into_iter()
            .fold(ColliderSet::with_ground(), ColliderSet::wall)
    }

    /// Whether a point lies inside the boundary on the XZ plane.
    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        position.x.abs() < self.half_size && position.z.abs() < self.half_size
    }

    /// Whether a standing body of `radius` at `position` would overlap an
    /// obstacle or poke through the boundary.
    #[must_use]
    pub fn is_clear(&self, position: Vec3, radius: f32) -> bool {
        let inset = self.half_size - radius;
        position.x.abs() <= inset
            && position.z.abs() <= inset
            && !self
                .obstacles
                .iter()
                .any(|o| o.overlaps_sphere(Vec3::new(position.x, o.min.y.max(0.0), position.z), radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::geometry::{GeometryQuery, LayerMask, RayQuery};

    #[test]
    fn test_training_layout() {
        let arena = ArenaLayout::training();
        assert_eq!(arena.walls().len(), 5);
        assert!(arena.contains(Vec3::new(9.0, 0.0, -9.0)));
        assert!(!arena.contains(Vec3::new(10.5, 0.0, 0.0)));
    }

    #[test]
    fn test_boundary_stops_rays() {
        let world = ArenaLayout::open(10.0).colliders();
        let ray = RayQuery::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 50.0, LayerMask::WALLS);
        let hit = world.raycast(&ray).unwrap();
        assert!((hit.distance - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_central_obstacle_blocks_line_of_sight() {
        let world = ArenaLayout::training().colliders();
        let ray = RayQuery::new(Vec3::new(0.0, 1.5, -7.0), Vec3::Z, 14.0, LayerMask::WALLS);
        let hit = world.raycast(&ray).unwrap();
        assert!((hit.distance - 5.5).abs() < 1e-4);
    }

    #[test]
    fn test_is_clear() {
        let arena = ArenaLayout::training();
        assert!(arena.is_clear(Vec3::new(0.0, 0.0, -7.0), 0.5));
        assert!(!arena.is_clear(Vec3::new(0.0, 0.0, 1.8), 0.5));
        assert!(!arena.is_clear(Vec3::new(9.8, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_layout_from_ron() {
        let arena: ArenaLayout = ron::from_str(
            "(half_size: 6.0, obstacles: [(min: (-1.0, 0.0, -1.0), max: (1.0, 2.0, 1.0))])",
        )
        .unwrap();
        assert_eq!(arena.half_size, 6.0);
        assert_eq!(arena.wall_height, 3.0);
        assert_eq!(arena.obstacles.len(), 1);
    }
}
