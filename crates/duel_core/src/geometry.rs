//! Geometry query seam.
//!
//! The core never owns a physics world. Everything it knows about walls, the
//! ground and the opponent's body comes through [`GeometryQuery`], which the
//! host environment implements over its own colliders.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable identifier of an agent body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Collision layer of a hit surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Static obstacles and arena boundaries.
    Wall,
    /// Agent bodies.
    Agent,
    /// Walkable floor.
    Ground,
}

impl Layer {
    /// Single-layer mask.
    #[must_use]
    pub const fn mask(self) -> LayerMask {
        match self {
            Self::Wall => LayerMask::WALLS,
            Self::Agent => LayerMask::AGENTS,
            Self::Ground => LayerMask::GROUND,
        }
    }
}

/// Set of layers a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Static obstacles.
    pub const WALLS: Self = Self(1);
    /// Agent bodies.
    pub const AGENTS: Self = Self(1 << 1);
    /// Floor.
    pub const GROUND: Self = Self(1 << 2);
    /// Obstacles plus agents, the combat sensing mask.
    pub const COMBAT: Self = Self(Self::WALLS.0 | Self::AGENTS.0);

    /// Union of two masks.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `layer` is part of this mask.
    #[must_use]
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.mask().0 != 0
    }
}

/// A ray cast request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    /// Ray start.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    /// Maximum travel distance.
    pub max_distance: f32,
    /// Layers that can stop the ray.
    pub mask: LayerMask,
    /// Agent body the ray starts inside of and must pass through.
    pub ignore: Option<AgentId>,
}

impl RayQuery {
    /// Ray against `mask` with no ignored body.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            mask,
            ignore: None,
        }
    }

    /// Skip the given agent body.
    #[must_use]
    pub const fn ignoring(mut self, agent: AgentId) -> Self {
        self.ignore = Some(agent);
        self
    }
}

/// Nearest surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// Layer of the struck surface.
    pub layer: Layer,
    /// Agent owning the struck body, for [`Layer::Agent`] hits.
    pub agent: Option<AgentId>,
}

/// Ray and overlap queries against the host world.
pub trait GeometryQuery {
    /// Nearest hit along the ray, if any surface in the mask is within range.
    fn raycast(&self, query: &RayQuery) -> Option<RayHit>;

    /// Whether a sphere overlaps any collider in the mask.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;
}

impl<T: GeometryQuery + ?Sized> GeometryQuery for &T {
    fn raycast(&self, query: &RayQuery) -> Option<RayHit> {
        (**self).raycast(query)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        (**self).overlap_sphere(center, radius, mask)
    }
}

/// A world with no colliders at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyWorld;

impl GeometryQuery for EmptyWorld {
    fn raycast(&self, _query: &RayQuery) -> Option<RayHit> {
        None
    }

    fn overlap_sphere(&self, _center: Vec3, _radius: f32, _mask: LayerMask) -> bool {
        false
    }
}
