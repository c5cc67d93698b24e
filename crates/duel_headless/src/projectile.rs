//! Straight-line projectiles.
//!
//! A projectile is swept each tick against walls and agent bodies, so fast
//! shots cannot tunnel through thin geometry. It also tracks whether it has
//! entered the near-miss radius of the agent it was aimed at; leaving that
//! radius again without a hit counts as a dodge.

use duel_core::events::FireCommand;
use duel_core::geometry::{AgentId, GeometryQuery, Layer, LayerMask, RayQuery};
use duel_core::math::{normalize_or, planar_distance};
use duel_core::shapes::ColliderSet;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Projectile lifetime and near-miss tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Seconds before an unobstructed projectile despawns.
    pub lifetime: f32,
    /// Horizontal radius around the target that counts as a near miss.
    pub near_miss_radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            lifetime: 5.0,
            near_miss_radius: 2.0,
        }
    }
}

/// What happened to a projectile during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOutcome {
    /// Still in flight.
    Flying,
    /// Struck an agent body.
    Hit(AgentId),
    /// Struck a wall.
    Blocked,
    /// Lifetime ran out.
    Expired,
    /// Left the target's near-miss radius without hitting. Still in flight.
    Dodged(AgentId),
}

impl ProjectileOutcome {
    /// Whether the projectile should be removed.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Hit(_) | Self::Blocked | Self::Expired)
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Shooter; never hit by its own shot.
    pub owner: AgentId,
    /// Agent the shot was aimed at, tracked for near misses.
    pub target: Option<AgentId>,
    /// Current position.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Seconds since launch.
    pub age: f32,
    /// Whether the projectile is inside the target's near-miss radius.
    pub near_target: bool,
}

impl Projectile {
    /// Launch from a fire command.
    #[must_use]
    pub fn launch(owner: AgentId, target: Option<AgentId>, shot: &FireCommand) -> Self {
        let direction = normalize_or(shot.direction, Vec3::Z);
        Self {
            owner,
            target,
            position: shot.origin,
            velocity: direction * shot.speed.max(0.0),
            age: 0.0,
            near_target: false,
        }
    }

    /// Advance by `dt` through `world`.
    pub fn step(&mut self, dt: f32, world: &ColliderSet, config: &ProjectileConfig) -> ProjectileOutcome {
        if let Some(victim) = self.embedded_in(world) {
            return ProjectileOutcome::Hit(victim);
        }

        let speed = self.velocity.length();
        let travel = speed * dt;
        if travel > 0.0 {
            let ray = RayQuery::new(self.position, self.velocity / speed, travel, LayerMask::COMBAT)
                .ignoring(self.owner);
            if let Some(hit) = world.raycast(&ray) {
                self.position = hit.point;
                return match (hit.layer, hit.agent) {
                    (Layer::Agent, Some(victim)) => ProjectileOutcome::Hit(victim),
                    _ => ProjectileOutcome::Blocked,
                };
            }
        }
        self.position += self.velocity * dt;
        self.age += dt;

        if let Some(outcome) = self.track_near_miss(world, config) {
            return outcome;
        }
        if self.age >= config.lifetime {
            return ProjectileOutcome::Expired;
        }
        ProjectileOutcome::Flying
    }

    fn embedded_in(&self, world: &ColliderSet) -> Option<AgentId> {
        world
            .agents
            .iter()
            .find(|(id, body)| *id != self.owner && body.contains(self.position))
            .map(|(id, _)| *id)
    }

    fn track_near_miss(&mut self, world: &ColliderSet, config: &ProjectileConfig) -> Option<ProjectileOutcome> {
        let target = self.target?;
        let (_, body) = world.agents.iter().find(|(id, _)| *id == target)?;
        let inside = planar_distance(self.position, body.base) < config.near_miss_radius;
        let left = self.near_target && !inside;
        self.near_target = inside;
        left.then_some(ProjectileOutcome::Dodged(target))
    }

    /// Bit pattern for state hashing.
    #[must_use]
    pub fn bits(&self) -> [u32; 9] {
        [
            self.owner.0,
            self.target.map_or(u32::MAX, |t| t.0),
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.velocity.x.to_bits(),
            self.velocity.z.to_bits(),
            self.age.to_bits(),
            u32::from(self.near_target),
        ]
    }
}
