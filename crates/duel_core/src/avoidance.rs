//! Avoidance planner.
//!
//! Casts a small fan of candidate headings around the current facing
//! (`(i - n/2) * step` degrees, so ±90° for the default five at 45°) and
//! picks one:
//!
//! 1. the first candidate whose ray hits nothing, or
//! 2. if every candidate is blocked, the one with the strictly largest hit
//!    distance, ties going to the lowest index.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::Pose;
use crate::config::AvoidanceConfig;
use crate::geometry::{GeometryQuery, LayerMask, RayQuery};
use crate::math::{normalize_or, rotate_yaw, UP};

/// Pick a heading from `(direction, hit distance)` candidates.
///
/// `None` as a hit distance means the ray was unobstructed. Returns `None`
/// only for an empty candidate list.
pub fn select_heading<I>(candidates: I) -> Option<Vec3>
where
    I: IntoIterator<Item = (Vec3, Option<f32>)>,
{
    let mut best: Option<(Vec3, f32)> = None;
    for (direction, hit) in candidates {
        let Some(distance) = hit else {
            return Some(direction);
        };
        let distance = if distance.is_finite() { distance } else { 0.0 };
        match best {
            Some((_, best_distance)) if distance <= best_distance => {}
            _ => best = Some((direction, distance)),
        }
    }
    best.map(|(direction, _)| direction)
}

/// Candidate-fan obstacle avoidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidancePlanner {
    config: AvoidanceConfig,
    eye_height: f32,
}

impl AvoidancePlanner {
    /// Planner casting its rays from `eye_height` above the feet.
    #[must_use]
    pub fn new(config: AvoidanceConfig, eye_height: f32) -> Self {
        Self { config, eye_height }
    }

    /// Avoidance parameters.
    #[must_use]
    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    /// Candidate headings around `forward`, in evaluation order.
    #[must_use]
    pub fn candidate_headings(&self, forward: Vec3) -> Vec<Vec3> {
        let n = self.config.candidate_count;
        let half = (n / 2) as f32;
        (0..n)
            .map(|i| rotate_yaw(forward, (i as f32 - half) * self.config.angle_step))
            .collect()
    }

    /// Plan an avoidance heading from `pose`.
    ///
    /// Falls back to the current facing when no candidates are configured.
    pub fn plan<G: GeometryQuery + ?Sized>(&self, pose: &Pose, geometry: &G) -> Vec3 {
        let origin = pose.position + UP * self.eye_height;
        let distance = self.config.check_distance;
        let samples = self.candidate_headings(pose.forward).into_iter().map(|dir| {
            let hit = geometry
                .raycast(&RayQuery::new(origin, dir, distance, LayerMask::WALLS))
                .map(|h| h.distance);
            (dir, hit)
        });
        let chosen = select_heading(samples).unwrap_or(pose.forward);
        tracing::trace!(x = chosen.x, z = chosen.z, "Planned avoidance heading");
        normalize_or(chosen, pose.forward)
    }

    /// Whether a wall lies along `direction` before `target_distance`.
    ///
    /// The ray never reaches past the check distance, so walls behind a
    /// close target do not count.
    pub fn is_blocked<G: GeometryQuery + ?Sized>(
        &self,
        pose: &Pose,
        direction: Vec3,
        target_distance: f32,
        geometry: &G,
    ) -> bool {
        let reach = self.config.check_distance.min(target_distance);
        if reach.is_nan() || reach <= 0.0 {
            return false;
        }
        let origin = pose.position + UP * self.eye_height;
        geometry
            .raycast(&RayQuery::new(origin, direction, reach, LayerMask::WALLS))
            .is_some()
    }
}
