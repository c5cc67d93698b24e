//! Minimal collider primitives.
//!
//! Hosts without a physics engine can describe an arena as a handful of
//! axis-aligned boxes and vertical cylinders and get a working
//! [`GeometryQuery`] from [`ColliderSet`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{AgentId, GeometryQuery, Layer, LayerMask, RayHit, RayQuery};

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box from a centre and half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Entry distance of a ray, `0` if it starts inside.
    #[must_use]
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (lo - o) * inv;
                let mut t2 = (hi - o) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }
        Some(t_min)
    }

    /// Whether a sphere touches the box.
    #[must_use]
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Whether a point lies inside the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Upright cylinder standing on `base`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// Centre of the bottom face.
    pub base: Vec3,
    /// Radius.
    pub radius: f32,
    /// Height.
    pub height: f32,
}

impl Cylinder {
    /// Cylinder standing on `base`.
    #[must_use]
    pub const fn new(base: Vec3, radius: f32, height: f32) -> Self {
        Self {
            base,
            radius,
            height,
        }
    }

    /// Nearest side-wall hit distance, `0` if the ray starts inside.
    #[must_use]
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        if self.contains(origin) {
            return Some(0.0);
        }
        let ox = origin.x - self.base.x;
        let oz = origin.z - self.base.z;
        let a = direction.x * direction.x + direction.z * direction.z;
        if a < 1e-10 {
            return None;
        }
        let b = 2.0 * (ox * direction.x + oz * direction.z);
        let c = ox * ox + oz * oz - self.radius * self.radius;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()) / (2.0 * a);
        if t < 0.0 || t > max_distance {
            return None;
        }
        let y = origin.y + direction.y * t;
        (y >= self.base.y && y <= self.base.y + self.height).then_some(t)
    }

    /// Whether a sphere touches the cylinder.
    #[must_use]
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        let dx = center.x - self.base.x;
        let dz = center.z - self.base.z;
        let horizontal = ((dx * dx + dz * dz).sqrt() - self.radius).max(0.0);
        let top = self.base.y + self.height;
        let vertical = if center.y < self.base.y {
            self.base.y - center.y
        } else if center.y > top {
            center.y - top
        } else {
            0.0
        };
        horizontal * horizontal + vertical * vertical <= radius * radius
    }

    /// Whether a point lies inside the cylinder.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let dx = point.x - self.base.x;
        let dz = point.z - self.base.z;
        dx * dx + dz * dz <= self.radius * self.radius
            && point.y >= self.base.y
            && point.y <= self.base.y + self.height
    }
}

/// Walls, agent bodies and an optional flat floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderSet {
    /// Static obstacles.
    pub walls: Vec<Aabb>,
    /// Agent bodies.
    pub agents: Vec<(AgentId, Cylinder)>,
    /// Floor height, if there is a floor.
    pub ground: Option<f32>,
}

impl ColliderSet {
    /// Empty set with a floor at `y = 0`.
    #[must_use]
    pub fn with_ground() -> Self {
        Self {
            ground: Some(0.0),
            ..Self::default()
        }
    }

    /// Add a wall.
    #[must_use]
    pub fn wall(mut self, wall: Aabb) -> Self {
        self.walls.push(wall);
        self
    }

    /// Add an agent body.
    #[must_use]
    pub fn agent(mut self, id: AgentId, body: Cylinder) -> Self {
        self.agents.push((id, body));
        self
    }

    /// Move or insert an agent body.
    pub fn set_agent(&mut self, id: AgentId, body: Cylinder) {
        match self.agents.iter_mut().find(|(a, _)| *a == id) {
            Some(entry) => entry.1 = body,
            None => self.agents.push((id, body)),
        }
    }
}

impl GeometryQuery for ColliderSet {
    fn raycast(&self, query: &RayQuery) -> Option<RayHit> {
        let RayQuery {
            origin,
            direction,
            max_distance,
            mask,
            ignore,
        } = *query;
        if !direction.is_finite() || !origin.is_finite() || max_distance <= 0.0 {
            return None;
        }
        let mut best: Option<(f32, Layer, Option<AgentId>)> = None;
        let mut offer = |t: f32, layer: Layer, agent: Option<AgentId>| {
            if best.map_or(true, |(bt, _, _)| t < bt) {
                best = Some((t, layer, agent));
            }
        };

        if mask.contains(Layer::Wall) {
            for wall in &self.walls {
                if let Some(t) = wall.ray_hit(origin, direction, max_distance) {
                    offer(t, Layer::Wall, None);
                }
            }
        }
        if mask.contains(Layer::Agent) {
            for (id, body) in &self.agents {
                if Some(*id) == ignore {
                    continue;
                }
                if let Some(t) = body.ray_hit(origin, direction, max_distance) {
                    offer(t, Layer::Agent, Some(*id));
                }
            }
        }
        if let (true, Some(height)) = (mask.contains(Layer::Ground), self.ground) {
            if direction.y < -1e-8 {
                let t = (height - origin.y) / direction.y;
                if (0.0..=max_distance).contains(&t) {
                    offer(t, Layer::Ground, None);
                }
            }
        }

        best.map(|(distance, layer, agent)| RayHit {
            distance,
            point: origin + direction * distance,
            layer,
            agent,
        })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        (mask.contains(Layer::Wall) && self.walls.iter().any(|w| w.overlaps_sphere(center, radius)))
            || (mask.contains(Layer::Agent)
                && self
                    .agents
                    .iter()
                    .any(|(_, body)| body.overlaps_sphere(center, radius)))
            || (mask.contains(Layer::Ground)
                && self.ground.is_some_and(|height| center.y - radius <= height))
    }
}
