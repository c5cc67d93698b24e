//! Static tuning parameters.
//!
//! Every number that shapes agent behaviour lives here, grouped by the
//! component that reads it. All structs implement [`Default`] with the
//! reference tuning and deserialize with `#[serde(default)]`, so a RON file
//! only needs to name the values it overrides:
//!
//! ```ron
//! (
//!     tick_seconds: 0.02,
//!     agent: (
//!         behavior: (optimal_distance: 6.0),
//!         combat: (weapon: None),
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DuelError, Result};

/// Locomotion and turning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed in m/s.
    pub move_speed: f32,
    /// Rate at which horizontal speed eases toward its target.
    pub speed_change_rate: f32,
    /// Speeds below this snap to zero.
    pub min_speed: f32,
    /// Movement requests shorter than this are ignored.
    pub dead_zone: f32,
    /// Fractional speed loss while reloading.
    pub reload_speed_penalty: f32,
    /// Vertical acceleration (negative is down).
    pub gravity: f32,
    /// Maximum falling speed.
    pub terminal_velocity: f32,
    /// Vertical velocity held while grounded.
    pub grounded_velocity: f32,
    /// Height of the ground probe sphere centre above the feet.
    pub ground_probe_height: f32,
    /// Radius of the ground probe sphere.
    pub ground_probe_radius: f32,
    /// Facing turn rate toward the opponent, degrees per second.
    pub turn_rate: f32,
    /// Facing turn rate while recovering from being stuck.
    pub recovery_turn_rate: f32,
    /// Turn rate applied for external policy rotate actions.
    pub policy_turn_rate: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            speed_change_rate: 10.0,
            min_speed: 0.1,
            dead_zone: 0.2,
            reload_speed_penalty: 0.2,
            gravity: -15.0,
            terminal_velocity: 53.0,
            grounded_velocity: -2.0,
            ground_probe_height: 0.14,
            ground_probe_radius: 0.28,
            turn_rate: 120.0,
            recovery_turn_rate: 240.0,
            policy_turn_rate: 90.0,
        }
    }
}

/// Projectile launcher mounted on the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Projectile speed in m/s.
    pub projectile_speed: f32,
    /// Muzzle offset along the facing direction.
    pub muzzle_forward: f32,
    /// Muzzle height above the feet.
    pub muzzle_height: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            projectile_speed: 20.0,
            muzzle_forward: 0.6,
            muzzle_height: 0.5,
        }
    }
}

/// Fire, reload and dash parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Seconds from firing until the next shot is available.
    pub reload_time: f32,
    /// Forced speed while dashing.
    pub dash_speed: f32,
    /// Dash length in seconds.
    pub dash_duration: f32,
    /// Seconds between dash starts.
    pub dash_cooldown: f32,
    /// Maximum distance at which the scripted controller fires.
    pub fire_range: f32,
    /// Opponent distance that triggers a dash.
    pub danger_radius: f32,
    /// Mounted weapon. `None` turns fire intents into no-ops.
    pub weapon: Option<WeaponConfig>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            reload_time: 3.0,
            dash_speed: 10.0,
            dash_duration: 0.3,
            dash_cooldown: 2.0,
            fire_range: 10.0,
            danger_radius: 4.0,
            weapon: Some(WeaponConfig::default()),
        }
    }
}

/// Ray fan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    /// Rays in the full-circle combat fan.
    pub ray_count: usize,
    /// Maximum ray length; also the detection range for the opponent.
    pub range: f32,
    /// Height of the eye above the feet for line-of-sight rays.
    pub eye_height: f32,
    /// Wall-only rays in the observation vector.
    pub observation_ray_count: usize,
    /// Wall-only rays in the forward half-plane probe.
    pub wall_probe_count: usize,
    /// Range of the forward half-plane probe.
    pub wall_probe_range: f32,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            ray_count: 16,
            range: 15.0,
            eye_height: 0.5,
            observation_ray_count: 8,
            wall_probe_count: 5,
            wall_probe_range: 2.0,
        }
    }
}

/// Candidate fan for obstacle avoidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Number of candidate headings.
    pub candidate_count: usize,
    /// Angular step between candidates, in degrees.
    pub angle_step: f32,
    /// Obstacle check distance per candidate and toward the opponent.
    pub check_distance: f32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            candidate_count: 5,
            angle_step: 45.0,
            check_distance: 3.0,
        }
    }
}

/// Stuck detection and replanning cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    /// Seconds between position samples.
    pub sample_interval: f32,
    /// Displacement per sample below which the sample counts as low movement.
    pub min_displacement: f32,
    /// Consecutive low-movement samples needed before the agent is stuck.
    pub samples_to_stuck: u32,
    /// Stuck duration that must elapse before recovery steering engages.
    pub grace_time: f32,
    /// Avoidance recompute interval while stuck.
    pub stuck_replan_interval: f32,
    /// Avoidance recompute interval while bypassing an obstacle.
    pub bypass_replan_interval: f32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            sample_interval: 0.5,
            min_displacement: 0.5,
            samples_to_stuck: 1,
            grace_time: 0.5,
            stuck_replan_interval: 0.3,
            bypass_replan_interval: 0.5,
        }
    }
}

/// Combat state machine thresholds and speed fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Preferred engagement distance.
    pub optimal_distance: f32,
    /// Half-width of the engagement band around the optimal distance.
    pub distance_band: f32,
    /// Seconds between registry probes while no opponent is known.
    pub search_interval: f32,
    /// Spin rate while searching, degrees per second.
    pub search_turn_rate: f32,
    /// Forward speed fraction while searching.
    pub search_advance: f32,
    /// Seconds after a shot during which the agent presses forward.
    pub post_shot_window: f32,
    /// Seconds between sidestep direction picks.
    pub sidestep_interval: f32,
    /// Probability of strafing toward the bias side.
    pub sidestep_majority: f32,
    /// Maximum forward/back jitter mixed into a sidestep.
    pub sidestep_jitter: f32,
    /// Speed fraction while chasing.
    pub chase_speed: f32,
    /// Speed fraction while advancing after a shot.
    pub post_shot_speed: f32,
    /// Speed fraction while backing off.
    pub reposition_speed: f32,
    /// Backward weight of the reposition vector.
    pub reposition_back_weight: f32,
    /// Lateral weight of the reposition vector.
    pub reposition_side_weight: f32,
    /// Speed fraction while sidestepping.
    pub sidestep_speed: f32,
    /// Speed fraction while recovering from being stuck.
    pub recovery_speed: f32,
    /// Speed fraction while bypassing an obstacle.
    pub bypass_speed: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            optimal_distance: 7.0,
            distance_band: 2.0,
            search_interval: 1.0,
            search_turn_rate: 45.0,
            search_advance: 0.3,
            post_shot_window: 1.5,
            sidestep_interval: 0.5,
            sidestep_majority: 0.7,
            sidestep_jitter: 0.3,
            chase_speed: 0.8,
            post_shot_speed: 0.8,
            reposition_speed: 0.6,
            reposition_back_weight: 0.7,
            reposition_side_weight: 0.3,
            sidestep_speed: 0.5,
            recovery_speed: 0.9,
            bypass_speed: 0.8,
        }
    }
}

/// Movement request smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Seconds a held request survives before a new one is adopted.
    pub hold_time: f32,
    /// Request change that is adopted immediately.
    pub change_threshold: f32,
    /// Blend factor toward the held request.
    pub blend: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            hold_time: 0.1,
            change_threshold: 0.5,
            blend: 0.5,
        }
    }
}

/// Everything an agent needs at construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Locomotion.
    pub movement: MovementConfig,
    /// Weapons and dash.
    pub combat: CombatConfig,
    /// Ray fans.
    pub sensing: SensingConfig,
    /// Avoidance fan.
    pub avoidance: AvoidanceConfig,
    /// Stuck detection.
    pub stuck: StuckConfig,
    /// State machine thresholds.
    pub behavior: BehaviorConfig,
    /// Request smoothing.
    pub smoothing: SmoothingConfig,
}

/// Reward shaping magnitudes.
///
/// Continuous terms are rates per second and get multiplied by the tick
/// length; one-shot terms (wall cap, terminal events) are applied as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Distance with the best distance reward.
    pub optimal_distance: f32,
    /// Rate of the distance-to-optimal term.
    pub distance_rate: f32,
    /// Distance beyond which the excess-distance penalty applies.
    pub excess_distance: f32,
    /// Rate of the excess-distance penalty.
    pub excess_distance_rate: f32,
    /// Aim alignment (dot product) above which the aim bonus applies.
    pub aim_threshold: f32,
    /// Rate of the aim bonus, scaled by alignment.
    pub aim_rate: f32,
    /// Distance inside which the proximity bonus ramps up.
    pub proximity_range: f32,
    /// Rate of the proximity bonus at zero distance.
    pub proximity_rate: f32,
    /// Rate of the line-of-sight bonus.
    pub visibility_rate: f32,
    /// Rate of the bonus for staying out of the opponent's sight.
    pub concealment_rate: f32,
    /// Seconds without sight of the opponent before the penalty starts.
    pub invisibility_threshold: f32,
    /// Base rate of the invisibility penalty.
    pub invisibility_rate: f32,
    /// Cap on the invisibility penalty escalation multiplier.
    pub invisibility_max_multiplier: f32,
    /// Seconds without an offensive action before the passivity penalty.
    pub passivity_threshold: f32,
    /// Rate of the passivity penalty.
    pub passivity_rate: f32,
    /// Sphere radius that counts as being near a wall.
    pub wall_near_radius: f32,
    /// Rate of the continuous near-wall penalty.
    pub wall_near_rate: f32,
    /// Near-wall duration whose every multiple triggers the cap penalty.
    pub wall_cap_time: f32,
    /// One-shot penalty each time the near-wall cap is crossed.
    pub wall_cap_penalty: f32,
    /// Forward wall distance that counts as very close.
    pub wall_close_distance: f32,
    /// Rate of the very-close wall penalty.
    pub wall_close_rate: f32,
    /// Stuck duration before the stuck penalty.
    pub stuck_threshold: f32,
    /// Rate of the stuck penalty.
    pub stuck_rate: f32,
    /// Reward for landing a hit.
    pub hit_landed: f32,
    /// Penalty magnitude for being hit.
    pub hit_taken: f32,
    /// Reward for a projectile passing close without hitting.
    pub dodge: f32,
    /// Required ratio of terminal reward to maximum per-tick shaping.
    pub dominance_factor: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            optimal_distance: 7.0,
            distance_rate: 0.4,
            excess_distance: 15.0,
            excess_distance_rate: 0.4,
            aim_threshold: 0.7,
            aim_rate: 0.8,
            proximity_range: 12.0,
            proximity_rate: 0.4,
            visibility_rate: 0.6,
            concealment_rate: 0.015,
            invisibility_threshold: 3.0,
            invisibility_rate: 0.25,
            invisibility_max_multiplier: 2.0,
            passivity_threshold: 5.0,
            passivity_rate: 0.5,
            wall_near_radius: 2.0,
            wall_near_rate: 0.3,
            wall_cap_time: 3.0,
            wall_cap_penalty: 0.015,
            wall_close_distance: 1.0,
            wall_close_rate: 0.5,
            stuck_threshold: 2.0,
            stuck_rate: 1.0,
            hit_landed: 1.0,
            hit_taken: 1.0,
            dodge: 0.3,
            dominance_factor: 10.0,
        }
    }
}

/// Top-level configuration: one agent profile, reward shaping, tick length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Fixed timestep in seconds.
    pub tick_seconds: f32,
    /// Agent tuning.
    pub agent: AgentConfig,
    /// Reward tuning.
    pub reward: RewardConfig,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.02,
            agent: AgentConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

fn positive(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DuelError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DuelError::invalid(
            field,
            format!("must be non-negative, got {value}"),
        ))
    }
}

fn fraction(field: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DuelError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

impl AgentConfig {
    /// Check ranges of every parameter.
    pub fn validate(&self) -> Result<()> {
        let m = &self.movement;
        positive("movement.move_speed", m.move_speed)?;
        positive("movement.speed_change_rate", m.speed_change_rate)?;
        non_negative("movement.min_speed", m.min_speed)?;
        fraction("movement.dead_zone", m.dead_zone)?;
        fraction("movement.reload_speed_penalty", m.reload_speed_penalty)?;
        if !m.gravity.is_finite() || m.gravity > 0.0 {
            return Err(DuelError::invalid(
                "movement.gravity",
                "must be finite and pointing down",
            ));
        }
        positive("movement.terminal_velocity", m.terminal_velocity)?;
        positive("movement.ground_probe_radius", m.ground_probe_radius)?;
        positive("movement.turn_rate", m.turn_rate)?;
        positive("movement.recovery_turn_rate", m.recovery_turn_rate)?;
        positive("movement.policy_turn_rate", m.policy_turn_rate)?;

        let c = &self.combat;
        positive("combat.reload_time", c.reload_time)?;
        positive("combat.dash_speed", c.dash_speed)?;
        non_negative("combat.dash_duration", c.dash_duration)?;
        non_negative("combat.dash_cooldown", c.dash_cooldown)?;
        non_negative("combat.fire_range", c.fire_range)?;
        non_negative("combat.danger_radius", c.danger_radius)?;
        if let Some(weapon) = &c.weapon {
            positive("combat.weapon.projectile_speed", weapon.projectile_speed)?;
        }

        let s = &self.sensing;
        if s.ray_count == 0 {
            return Err(DuelError::invalid("sensing.ray_count", "must be at least 1"));
        }
        positive("sensing.range", s.range)?;
        if s.wall_probe_count == 0 {
            return Err(DuelError::invalid(
                "sensing.wall_probe_count",
                "must be at least 1",
            ));
        }
        positive("sensing.wall_probe_range", s.wall_probe_range)?;

        let a = &self.avoidance;
        if a.candidate_count == 0 {
            return Err(DuelError::invalid(
                "avoidance.candidate_count",
                "must be at least 1",
            ));
        }
        positive("avoidance.check_distance", a.check_distance)?;

        let st = &self.stuck;
        positive("stuck.sample_interval", st.sample_interval)?;
        non_negative("stuck.min_displacement", st.min_displacement)?;
        if st.samples_to_stuck == 0 {
            return Err(DuelError::invalid(
                "stuck.samples_to_stuck",
                "must be at least 1",
            ));
        }
        non_negative("stuck.grace_time", st.grace_time)?;
        positive("stuck.stuck_replan_interval", st.stuck_replan_interval)?;
        positive("stuck.bypass_replan_interval", st.bypass_replan_interval)?;
        if st.stuck_replan_interval > st.bypass_replan_interval {
            return Err(DuelError::invalid(
                "stuck.stuck_replan_interval",
                "must not exceed bypass_replan_interval",
            ));
        }

        let b = &self.behavior;
        positive("behavior.optimal_distance", b.optimal_distance)?;
        non_negative("behavior.distance_band", b.distance_band)?;
        positive("behavior.search_interval", b.search_interval)?;
        positive("behavior.sidestep_interval", b.sidestep_interval)?;
        fraction("behavior.sidestep_majority", b.sidestep_majority)?;
        fraction("behavior.sidestep_jitter", b.sidestep_jitter)?;
        for (field, value) in [
            ("behavior.search_advance", b.search_advance),
            ("behavior.chase_speed", b.chase_speed),
            ("behavior.post_shot_speed", b.post_shot_speed),
            ("behavior.reposition_speed", b.reposition_speed),
            ("behavior.sidestep_speed", b.sidestep_speed),
            ("behavior.recovery_speed", b.recovery_speed),
            ("behavior.bypass_speed", b.bypass_speed),
        ] {
            fraction(field, value)?;
        }

        let sm = &self.smoothing;
        non_negative("smoothing.hold_time", sm.hold_time)?;
        non_negative("smoothing.change_threshold", sm.change_threshold)?;
        fraction("smoothing.blend", sm.blend)?;
        Ok(())
    }
}

impl RewardConfig {
    /// Largest net shaping reward (positive or negative) one tick can yield.
    ///
    /// Positive and negative terms are summed separately at their extreme
    /// values; the larger magnitude is returned.
    #[must_use]
    pub fn max_shaping_magnitude(&self, dt: f32) -> f32 {
        let positive = (self.distance_rate
            + self.aim_rate
            + self.proximity_rate
            + self.visibility_rate
            + self.concealment_rate)
            * dt;
        let negative = (self.distance_rate
            + self.excess_distance_rate
            + self.invisibility_rate * self.invisibility_max_multiplier.max(1.0)
            + self.passivity_rate
            + self.wall_near_rate
            + self.wall_close_rate
            + self.stuck_rate)
            * dt
            + self.wall_cap_penalty;
        positive.max(negative)
    }

    /// Smallest terminal reward magnitude.
    #[must_use]
    pub fn min_terminal_magnitude(&self) -> f32 {
        self.hit_landed.abs().min(self.hit_taken.abs())
    }

    /// Check ranges and that terminal rewards dominate shaping at `dt`.
    pub fn validate(&self, dt: f32) -> Result<()> {
        positive("tick_seconds", dt)?;
        for (field, value) in [
            ("reward.optimal_distance", self.optimal_distance),
            ("reward.excess_distance", self.excess_distance),
            ("reward.proximity_range", self.proximity_range),
            ("reward.invisibility_threshold", self.invisibility_threshold),
            ("reward.wall_near_radius", self.wall_near_radius),
            ("reward.wall_cap_time", self.wall_cap_time),
        ] {
            positive(field, value)?;
        }
        for (field, value) in [
            ("reward.distance_rate", self.distance_rate),
            ("reward.excess_distance_rate", self.excess_distance_rate),
            ("reward.aim_rate", self.aim_rate),
            ("reward.proximity_rate", self.proximity_rate),
            ("reward.visibility_rate", self.visibility_rate),
            ("reward.concealment_rate", self.concealment_rate),
            ("reward.invisibility_rate", self.invisibility_rate),
            ("reward.passivity_threshold", self.passivity_threshold),
            ("reward.passivity_rate", self.passivity_rate),
            ("reward.wall_near_rate", self.wall_near_rate),
            ("reward.wall_cap_penalty", self.wall_cap_penalty),
            ("reward.wall_close_distance", self.wall_close_distance),
            ("reward.wall_close_rate", self.wall_close_rate),
            ("reward.stuck_threshold", self.stuck_threshold),
            ("reward.stuck_rate", self.stuck_rate),
            ("reward.hit_landed", self.hit_landed),
            ("reward.hit_taken", self.hit_taken),
            ("reward.dodge", self.dodge),
            ("reward.dominance_factor", self.dominance_factor),
        ] {
            non_negative(field, value)?;
        }
        fraction("reward.aim_threshold", self.aim_threshold.abs())?;
        if self.invisibility_max_multiplier < 1.0 {
            return Err(DuelError::invalid(
                "reward.invisibility_max_multiplier",
                "must be at least 1",
            ));
        }

        let shaping = self.max_shaping_magnitude(dt);
        let terminal = self.min_terminal_magnitude();
        if terminal < shaping * self.dominance_factor {
            return Err(DuelError::invalid(
                "reward.hit_landed",
                format!(
                    "terminal reward {terminal} must be at least {}x the per-tick shaping maximum {shaping}",
                    self.dominance_factor
                ),
            ));
        }
        Ok(())
    }
}

impl DuelConfig {
    /// Parse from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DuelError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Validate agent and reward parameters.
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.reward.validate(self.tick_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        DuelConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = DuelConfig::from_ron_str(
            "(agent: (behavior: (optimal_distance: 6.0), combat: (weapon: None)))",
        )
        .unwrap();
        assert_eq!(config.agent.behavior.optimal_distance, 6.0);
        assert!(config.agent.combat.weapon.is_none());
        assert_eq!(config.agent.movement.move_speed, 5.0);
        assert_eq!(config.tick_seconds, 0.02);
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = DuelConfig::from_ron_str("(tick_seconds: )").unwrap_err();
        assert!(matches!(err, DuelError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DuelConfig::load("/nonexistent/duel.ron").unwrap_err();
        assert!(matches!(err, DuelError::ConfigIo { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = DuelConfig::default();
        config.agent.sensing.ray_count = 0;
        assert!(config.validate().is_err());

        let mut config = DuelConfig::default();
        config.agent.stuck.stuck_replan_interval = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stuck_replan_interval"));
    }

    #[test]
    fn test_terminal_rewards_dominate_shaping() {
        let reward = RewardConfig::default();
        let shaping = reward.max_shaping_magnitude(0.02);
        assert!(shaping > 0.0);
        assert!(reward.min_terminal_magnitude() >= 10.0 * shaping);
    }

    #[test]
    fn test_long_ticks_break_dominance() {
        let reward = RewardConfig::default();
        assert!(reward.validate(0.02).is_ok());
        assert!(reward.validate(0.5).is_err());
    }
}
