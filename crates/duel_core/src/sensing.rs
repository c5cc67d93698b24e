//! Sensor array: ray fans, line of sight and wall proximity.
//!
//! All queries are pure reads of the [`GeometryQuery`] the host provides. A
//! full sensing pass costs `ray_count` ray casts.
//!
//! - [`SensorArray::sense`] casts the combat fan (walls + agents) on a full
//!   circle around the facing direction
//! - [`SensorArray::sense_walls`] casts a wall-only fan, either full circle or
//!   the forward half plane
//! - [`SensorArray::can_see`] checks that the first thing between the eye and
//!   a point is the opponent

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::Pose;
use crate::config::SensingConfig;
use crate::geometry::{AgentId, GeometryQuery, Layer, LayerMask, RayQuery};
use crate::math::{direction_between, planar_distance, rotate_yaw, wrap_degrees, yaw_of, UP};
use crate::registry::OpponentSnapshot;

/// One ray of a sensing fan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaySample {
    /// Angle relative to the facing direction, in degrees.
    pub angle_offset: f32,
    /// Hit distance divided by the fan range; `1.0` when nothing was hit.
    pub normalized_distance: f32,
}

/// Where the opponent is relative to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetContact {
    /// Horizontal distance to the opponent.
    pub distance: f32,
    /// Signed yaw from the facing direction to the opponent, in degrees.
    pub bearing: f32,
}

/// Result of one combat sensing pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensingSnapshot {
    /// Fan samples in ray order.
    pub rays: Vec<RaySample>,
    /// Whether any fan ray struck the opponent first.
    pub target_visible: bool,
    /// Opponent contact, present only when an opponent is resolved.
    pub target: Option<TargetContact>,
}

impl SensingSnapshot {
    /// Smallest normalized distance of the fan.
    #[must_use]
    pub fn nearest(&self) -> f32 {
        self.rays
            .iter()
            .map(|r| r.normalized_distance)
            .fold(1.0, f32::min)
    }
}

/// Angular layout of a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanCoverage {
    /// Evenly spaced on the full circle, starting at the facing direction.
    FullCircle,
    /// Evenly spaced from -90° to +90° inclusive.
    ForwardHalf,
}

impl FanCoverage {
    /// Angle offsets for `count` rays.
    #[must_use]
    pub fn angles(self, count: usize) -> Vec<f32> {
        match (self, count) {
            (_, 0) => Vec::new(),
            (Self::ForwardHalf, 1) => vec![0.0],
            (Self::FullCircle, n) => {
                let step = 360.0 / n as f32;
                (0..n).map(|i| wrap_degrees(i as f32 * step)).collect()
            }
            (Self::ForwardHalf, n) => {
                let step = 180.0 / (n - 1) as f32;
                (0..n).map(|i| -90.0 + i as f32 * step).collect()
            }
        }
    }
}

/// Ray-fan sensing for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorArray {
    owner: AgentId,
    config: SensingConfig,
}

impl SensorArray {
    /// Sensor owned by `owner`; its own body never blocks its rays.
    #[must_use]
    pub fn new(owner: AgentId, config: SensingConfig) -> Self {
        Self { owner, config }
    }

    /// Sensing parameters.
    #[must_use]
    pub fn config(&self) -> &SensingConfig {
        &self.config
    }

    /// Eye position for a pose.
    #[must_use]
    pub fn eye(&self, pose: &Pose) -> Vec3 {
        pose.position + UP * self.config.eye_height
    }

    /// Cast the combat fan.
    pub fn sense<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        opponent: Option<&OpponentSnapshot>,
        geometry: &G,
    ) -> SensingSnapshot {
        let range = self.config.range;
        let origin = self.eye(pose);
        let mut target_visible = false;

        let rays = FanCoverage::FullCircle
            .angles(self.config.ray_count)
            .into_iter()
            .map(|angle_offset| {
                let direction = rotate_yaw(pose.forward, angle_offset);
                let query =
                    RayQuery::new(origin, direction, range, LayerMask::COMBAT).ignoring(self.owner);
                let normalized_distance = match geometry.raycast(&query) {
                    Some(hit) => {
                        if let Some(opponent) = opponent {
                            if hit.layer == Layer::Agent && hit.agent == Some(opponent.id) {
                                target_visible = true;
                            }
                        }
                        (hit.distance / range).clamp(0.0, 1.0)
                    }
                    None => 1.0,
                };
                RaySample {
                    angle_offset,
                    normalized_distance,
                }
            })
            .collect();

        let target = opponent.map(|opponent| {
            let to = direction_between(pose.position, opponent.pose.position, pose.forward);
            TargetContact {
                distance: planar_distance(pose.position, opponent.pose.position),
                bearing: wrap_degrees(yaw_of(to) - yaw_of(pose.forward)),
            }
        });

        SensingSnapshot {
            rays,
            target_visible,
            target,
        }
    }

    /// Cast a wall-only fan of `count` rays up to `range`.
    pub fn sense_walls<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        coverage: FanCoverage,
        count: usize,
        range: f32,
        geometry: &G,
    ) -> Vec<RaySample> {
        let origin = self.eye(pose);
        coverage
            .angles(count)
            .into_iter()
            .map(|angle_offset| {
                let direction = rotate_yaw(pose.forward, angle_offset);
                let query = RayQuery::new(origin, direction, range, LayerMask::WALLS);
                let normalized_distance = geometry
                    .raycast(&query)
                    .map_or(1.0, |hit| (hit.distance / range).clamp(0.0, 1.0));
                RaySample {
                    angle_offset,
                    normalized_distance,
                }
            })
            .collect()
    }

    /// Distance to the nearest wall in the forward half plane, if within the
    /// probe range.
    pub fn forward_wall_distance<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        geometry: &G,
    ) -> Option<f32> {
        let range = self.config.wall_probe_range;
        let nearest = self
            .sense_walls(
                pose,
                FanCoverage::ForwardHalf,
                self.config.wall_probe_count,
                range,
                geometry,
            )
            .iter()
            .map(|r| r.normalized_distance)
            .fold(1.0, f32::min);
        (nearest < 1.0).then_some(nearest * range)
    }

    /// Whether the first obstruction from `eye` toward `point` is `target`.
    ///
    /// `viewer` is the body the ray starts in.
    pub fn line_of_sight<G: GeometryQuery + ?Sized>(
        viewer: AgentId,
        eye: Vec3,
        target: AgentId,
        point: Vec3,
        geometry: &G,
    ) -> bool {
        let delta = point - eye;
        let distance = delta.length();
        if !distance.is_finite() || distance <= f32::EPSILON {
            return false;
        }
        // Slightly past the point so a hit exactly on the surface still counts.
        let query = RayQuery::new(eye, delta / distance, distance + 0.01, LayerMask::COMBAT)
            .ignoring(viewer);
        matches!(
            geometry.raycast(&query),
            Some(hit) if hit.layer == Layer::Agent && hit.agent == Some(target)
        )
    }

    /// Whether this agent has line of sight to the opponent.
    pub fn can_see<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        opponent: &OpponentSnapshot,
        geometry: &G,
    ) -> bool {
        Self::line_of_sight(
            self.owner,
            self.eye(pose),
            opponent.id,
            opponent.eye_point(),
            geometry,
        )
    }

    /// Whether the opponent has line of sight to this agent at `pose`.
    pub fn is_seen_by<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        opponent: &OpponentSnapshot,
        geometry: &G,
    ) -> bool {
        Self::line_of_sight(
            opponent.id,
            opponent.eye_point(),
            self.owner,
            self.eye(pose),
            geometry,
        )
    }

    /// Whether any wall lies within `radius` of `position`.
    pub fn is_near_wall<G: GeometryQuery + ?Sized>(
        position: Vec3,
        radius: f32,
        geometry: &G,
    ) -> bool {
        geometry.overlap_sphere(position, radius, LayerMask::WALLS)
    }
}
