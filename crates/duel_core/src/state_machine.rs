//! Combat state machine.
//!
//! Each tick the machine walks a fixed priority list and the first matching
//! branch picks the movement state:
//!
//! 1. no opponent in range → [`CombatState::Searching`]
//! 2. stuck past the grace time → [`CombatState::StuckRecovery`]
//! 3. wall between agent and opponent → [`CombatState::Bypassing`]
//! 4. inside the post-shot window → [`CombatState::PostShotAdvance`]
//! 5. too far → [`CombatState::Chasing`]
//! 6. too close → [`CombatState::Repositioning`]
//! 7. otherwise → [`CombatState::Sidestepping`]
//!
//! Fire and dash intents are evaluated independently of the movement state.

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BehaviorConfig, CombatConfig, MovementConfig, StuckConfig};
use crate::math::{lateral, non_negative, normalize_or, vec3_bits};
use crate::timers::CombatTimers;

/// Movement state of the combat controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    /// No opponent: spin and creep forward.
    #[default]
    Searching,
    /// Close the distance.
    Chasing,
    /// Back off while drifting sideways.
    Repositioning,
    /// Strafe inside the engagement band.
    Sidestepping,
    /// Press forward after firing.
    PostShotAdvance,
    /// Steer out of a stuck position.
    StuckRecovery,
    /// Steer around a wall between the agent and its opponent.
    Bypassing,
}

impl CombatState {
    /// Whether movement follows the avoidance heading.
    #[must_use]
    pub const fn is_avoiding(self) -> bool {
        matches!(self, Self::StuckRecovery | Self::Bypassing)
    }

    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Searching => 0,
            Self::Chasing => 1,
            Self::Repositioning => 2,
            Self::Sidestepping => 3,
            Self::PostShotAdvance => 4,
            Self::StuckRecovery => 5,
            Self::Bypassing => 6,
        }
    }

    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Chasing => "chasing",
            Self::Repositioning => "repositioning",
            Self::Sidestepping => "sidestepping",
            Self::PostShotAdvance => "post_shot_advance",
            Self::StuckRecovery => "stuck_recovery",
            Self::Bypassing => "bypassing",
        }
    }
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the agent should turn this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Facing {
    /// Turn toward a direction at up to `rate` degrees per second.
    Toward {
        /// Desired facing.
        direction: Vec3,
        /// Maximum turn rate.
        rate: f32,
    },
    /// Spin at a signed rate in degrees per second.
    Spin {
        /// Turn rate; positive is clockwise seen from above.
        rate: f32,
    },
    /// Keep the current facing.
    Hold,
}

/// Opponent as seen by the decision step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Horizontal distance.
    pub distance: f32,
    /// Horizontal unit direction from the agent.
    pub direction: Vec3,
    /// Line of sight holds.
    pub in_sight: bool,
}

/// Inputs of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionContext {
    /// Tick length.
    pub dt: f32,
    /// Current facing.
    pub forward: Vec3,
    /// Opponent within detection range.
    pub target: Option<TargetView>,
    /// A wall blocks the straight line toward the opponent.
    pub heading_blocked: bool,
    /// Stuck detector verdict.
    pub is_stuck: bool,
    /// Length of the current low-movement streak.
    pub stuck_duration: f32,
    /// Persisted avoidance heading.
    pub avoidance_direction: Vec3,
    /// Resource timers.
    pub timers: CombatTimers,
}

/// Output of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Selected movement state.
    pub state: CombatState,
    /// Movement request, magnitude ≤ 1.
    pub movement: Vec3,
    /// Turning intent.
    pub facing: Facing,
    /// Fire this tick.
    pub fire: bool,
    /// Start a dash this tick.
    pub dash: bool,
    /// Avoidance heading recomputed during this decision.
    pub replanned: Option<Vec3>,
}

/// Thresholds the machine reads, gathered from the agent config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// State thresholds and speeds.
    pub behavior: BehaviorConfig,
    /// Stuck grace and replan cadence.
    pub stuck: StuckConfig,
    /// Fire range and dash radius.
    pub fire_range: f32,
    /// Dash trigger distance.
    pub danger_radius: f32,
    /// Facing turn rate.
    pub turn_rate: f32,
    /// Facing turn rate while stuck.
    pub recovery_turn_rate: f32,
}

impl MachineConfig {
    /// Gather from the component configs.
    #[must_use]
    pub fn new(
        behavior: BehaviorConfig,
        stuck: StuckConfig,
        combat: &CombatConfig,
        movement: &MovementConfig,
    ) -> Self {
        Self {
            behavior,
            stuck,
            fire_range: combat.fire_range,
            danger_radius: combat.danger_radius,
            turn_rate: movement.turn_rate,
            recovery_turn_rate: movement.recovery_turn_rate,
        }
    }
}

/// Priority-ordered combat controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStateMachine {
    config: MachineConfig,
    state: CombatState,
    /// Personality bias in `[-1, 1]`; negative favours the other side.
    bias: f32,
    sidestep_direction: Vec3,
    sidestep_elapsed: f32,
    replan_elapsed: f32,
    post_shot_elapsed: Option<f32>,
}

impl CombatStateMachine {
    /// Machine with the given personality bias.
    #[must_use]
    pub fn new(config: MachineConfig, bias: f32) -> Self {
        Self {
            config,
            state: CombatState::Searching,
            bias: if bias.is_finite() {
                bias.clamp(-1.0, 1.0)
            } else {
                0.0
            },
            sidestep_direction: Vec3::ZERO,
            sidestep_elapsed: 0.0,
            replan_elapsed: 0.0,
            post_shot_elapsed: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CombatState {
        self.state
    }

    /// Personality bias.
    #[must_use]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Whether the post-shot window is open.
    #[must_use]
    pub fn post_shot_active(&self) -> bool {
        self.post_shot_elapsed.is_some()
    }

    /// A shot was fired; open the post-shot window.
    pub fn notify_shot(&mut self) {
        self.post_shot_elapsed = Some(0.0);
    }

    /// Close the post-shot window early.
    pub fn clear_post_shot(&mut self) {
        self.post_shot_elapsed = None;
    }

    /// Forget transient state (spawn defaults); keeps the bias.
    pub fn reset(&mut self) {
        self.state = CombatState::Searching;
        self.sidestep_direction = Vec3::ZERO;
        self.sidestep_elapsed = 0.0;
        self.replan_elapsed = 0.0;
        self.post_shot_elapsed = None;
    }

    /// Evaluate the priority list and produce this tick's intents.
    ///
    /// `replan` is called when the avoidance heading is due for
    /// recomputation; its result is used immediately and returned in
    /// [`Decision::replanned`] so the caller can persist it.
    pub fn decide<R, F>(&mut self, ctx: &DecisionContext, rng: &mut R, mut replan: F) -> Decision
    where
        R: Rng + ?Sized,
        F: FnMut() -> Vec3,
    {
        let dt = non_negative(ctx.dt);
        let window = self.config.behavior.post_shot_window;
        if let Some(elapsed) = self.post_shot_elapsed {
            let elapsed = elapsed + dt;
            self.post_shot_elapsed = (elapsed < window).then_some(elapsed);
        }

        let Some(target) = ctx.target else {
            self.transition(CombatState::Searching);
            let b = &self.config.behavior;
            return Decision {
                state: CombatState::Searching,
                movement: ctx.forward * b.search_advance,
                facing: Facing::Spin {
                    rate: b.search_turn_rate,
                },
                fire: false,
                dash: false,
                replanned: None,
            };
        };

        let b = &self.config.behavior;
        let to_target = normalize_or(target.direction, ctx.forward);
        let state = if ctx.is_stuck && ctx.stuck_duration > self.config.stuck.grace_time {
            CombatState::StuckRecovery
        } else if ctx.heading_blocked {
            CombatState::Bypassing
        } else if self.post_shot_elapsed.is_some() {
            CombatState::PostShotAdvance
        } else if target.distance > b.optimal_distance + b.distance_band {
            CombatState::Chasing
        } else if target.distance < b.optimal_distance - b.distance_band {
            CombatState::Repositioning
        } else {
            CombatState::Sidestepping
        };
        let entered = self.transition(state);

        let mut replanned = None;
        let mut avoidance = ctx.avoidance_direction;
        if state.is_avoiding() {
            let interval = if state == CombatState::StuckRecovery {
                self.config.stuck.stuck_replan_interval
            } else {
                self.config.stuck.bypass_replan_interval
            };
            self.replan_elapsed += dt;
            if entered || self.replan_elapsed >= interval || avoidance.length_squared() < 1e-6 {
                self.replan_elapsed = 0.0;
                avoidance = replan();
                replanned = Some(avoidance);
            }
        }
        let avoidance = normalize_or(avoidance, ctx.forward);

        let b = &self.config.behavior;
        let (movement, facing) = match state {
            CombatState::StuckRecovery => (
                avoidance * b.recovery_speed,
                Facing::Toward {
                    direction: avoidance,
                    rate: self.config.recovery_turn_rate,
                },
            ),
            CombatState::Bypassing => (
                avoidance * b.bypass_speed,
                Facing::Toward {
                    direction: avoidance,
                    rate: self.config.turn_rate,
                },
            ),
            CombatState::PostShotAdvance => (to_target * b.post_shot_speed, self.face(to_target)),
            CombatState::Chasing => (to_target * b.chase_speed, self.face(to_target)),
            CombatState::Repositioning => {
                let side = lateral(to_target) * self.side_sign();
                let away = normalize_or(
                    -to_target * b.reposition_back_weight + side * b.reposition_side_weight,
                    -to_target,
                );
                (away * b.reposition_speed, self.face(to_target))
            }
            CombatState::Sidestepping => {
                self.sidestep_elapsed += dt;
                if entered
                    || self.sidestep_elapsed >= b.sidestep_interval
                    || self.sidestep_direction.length_squared() < 1e-6
                {
                    self.sidestep_elapsed = 0.0;
                    self.sidestep_direction = self.pick_sidestep(to_target, rng);
                }
                (
                    self.sidestep_direction * self.config.behavior.sidestep_speed,
                    self.face(to_target),
                )
            }
            CombatState::Searching => (
                ctx.forward * b.search_advance,
                Facing::Spin {
                    rate: b.search_turn_rate,
                },
            ),
        };

        let fire = target.distance <= self.config.fire_range
            && ctx.timers.can_fire()
            && target.in_sight;
        let dash = target.distance < self.config.danger_radius && ctx.timers.dash_ready();

        Decision {
            state,
            movement,
            facing,
            fire,
            dash,
            replanned,
        }
    }

    fn face(&self, direction: Vec3) -> Facing {
        Facing::Toward {
            direction,
            rate: self.config.turn_rate,
        }
    }

    fn side_sign(&self) -> f32 {
        if self.bias < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    fn pick_sidestep<R: Rng + ?Sized>(&self, to_target: Vec3, rng: &mut R) -> Vec3 {
        let b = &self.config.behavior;
        let mut side = lateral(to_target);
        let flip_chance = if self.bias < 0.0 {
            b.sidestep_majority
        } else {
            1.0 - b.sidestep_majority
        };
        if rng.gen::<f32>() < flip_chance {
            side = -side;
        }
        let jitter = if b.sidestep_jitter > 0.0 {
            rng.gen_range(-b.sidestep_jitter..=b.sidestep_jitter)
        } else {
            0.0
        };
        normalize_or(side + to_target * jitter, side)
    }

    fn transition(&mut self, next: CombatState) -> bool {
        if self.state == next {
            return false;
        }
        tracing::debug!(from = %self.state, to = %next, "Combat state changed");
        self.state = next;
        true
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.push(self.state.code());
        bits.push(self.bias.to_bits());
        bits.extend(vec3_bits(self.sidestep_direction));
        bits.push(self.sidestep_elapsed.to_bits());
        bits.push(self.replan_elapsed.to_bits());
        bits.push(self.post_shot_elapsed.map_or(u32::MAX, f32::to_bits));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{from_yaw, yaw_of};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn machine(bias: f32) -> CombatStateMachine {
        let combat = CombatConfig::default();
        let movement = MovementConfig::default();
        CombatStateMachine::new(
            MachineConfig::new(
                BehaviorConfig::default(),
                StuckConfig::default(),
                &combat,
                &movement,
            ),
            bias,
        )
    }

    fn ctx(distance: Option<f32>) -> DecisionContext {
        DecisionContext {
            dt: 0.02,
            forward: Vec3::Z,
            target: distance.map(|distance| TargetView {
                distance,
                direction: Vec3::Z,
                in_sight: true,
            }),
            heading_blocked: false,
            is_stuck: false,
            stuck_duration: 0.0,
            avoidance_direction: Vec3::ZERO,
            timers: CombatTimers::new(),
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn no_replan() -> Vec3 {
        panic!("unexpected replan")
    }

    #[test]
    fn test_no_opponent_searches() {
        let mut m = machine(0.5);
        let d = m.decide(&ctx(None), &mut rng(), no_replan);
        assert_eq!(d.state, CombatState::Searching);
        assert!(matches!(d.facing, Facing::Spin { rate } if rate == 45.0));
        assert!((d.movement - Vec3::Z * 0.3).length() < 1e-6);
        assert!(!d.fire && !d.dash);
    }

    #[test]
    fn test_distance_bands() {
        let mut m = machine(0.5);
        assert_eq!(
            m.decide(&ctx(Some(12.0)), &mut rng(), no_replan).state,
            CombatState::Chasing
        );
        assert_eq!(
            m.decide(&ctx(Some(7.0)), &mut rng(), no_replan).state,
            CombatState::Sidestepping
        );
        assert_eq!(
            m.decide(&ctx(Some(3.0)), &mut rng(), no_replan).state,
            CombatState::Repositioning
        );
    }

    #[test]
    fn test_in_band_fires_when_loaded_and_visible() {
        let mut m = machine(0.5);
        let d = m.decide(&ctx(Some(7.0)), &mut rng(), no_replan);
        assert!(d.fire);
        assert!(!d.dash);

        let mut reloading = ctx(Some(7.0));
        reloading.timers.start_reload(3.0);
        assert!(!m.decide(&reloading, &mut rng(), no_replan).fire);

        let mut hidden = ctx(Some(7.0));
        hidden.target = hidden.target.map(|t| TargetView {
            in_sight: false,
            ..t
        });
        assert!(!m.decide(&hidden, &mut rng(), no_replan).fire);

        assert!(!m.decide(&ctx(Some(10.5)), &mut rng(), no_replan).fire);
    }

    #[test]
    fn test_dash_inside_danger_radius() {
        let mut m = machine(0.5);
        let d = m.decide(&ctx(Some(3.0)), &mut rng(), no_replan);
        assert!(d.dash);

        let mut cooling = ctx(Some(3.0));
        cooling.timers.start_dash(0.3, 2.0);
        assert!(!m.decide(&cooling, &mut rng(), no_replan).dash);
    }

    #[test]
    fn test_reposition_backs_away_toward_bias_side() {
        let positive = machine(0.5).decide(&ctx(Some(3.0)), &mut rng(), no_replan);
        let negative = machine(-0.5).decide(&ctx(Some(3.0)), &mut rng(), no_replan);
        assert!(positive.movement.z < 0.0);
        assert!(negative.movement.z < 0.0);
        assert!(positive.movement.x * negative.movement.x < 0.0);
        assert!((positive.movement.length() - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_sidestep_holds_between_picks() {
        let mut m = machine(0.5);
        let mut r = rng();
        let first = m.decide(&ctx(Some(7.0)), &mut r, no_replan).movement;
        let second = m.decide(&ctx(Some(7.0)), &mut r, no_replan).movement;
        assert_eq!(first, second);
        assert!((first.length() - 0.5).abs() < 1e-5);
        assert!(first.x.abs() > first.z.abs());
    }

    #[test]
    fn test_post_shot_window() {
        let mut m = machine(0.5);
        m.notify_shot();
        let d = m.decide(&ctx(Some(7.0)), &mut rng(), no_replan);
        assert_eq!(d.state, CombatState::PostShotAdvance);
        assert!((d.movement - Vec3::Z * 0.8).length() < 1e-6);

        let mut late = ctx(Some(7.0));
        late.dt = 2.0;
        assert_eq!(
            m.decide(&late, &mut rng(), no_replan).state,
            CombatState::Sidestepping
        );
        assert!(!m.post_shot_active());
    }

    #[test]
    fn test_stuck_recovery_replans_on_entry_and_interval() {
        let mut m = machine(0.5);
        let mut stuck = ctx(Some(7.0));
        stuck.is_stuck = true;
        stuck.stuck_duration = 1.0;
        stuck.dt = 0.125;
        let mut calls = 0;
        let heading = from_yaw(90.0);

        let d = m.decide(&stuck, &mut rng(), || {
            calls += 1;
            heading
        });
        assert_eq!(d.state, CombatState::StuckRecovery);
        assert_eq!(d.replanned, Some(heading));
        assert!((d.movement - heading * 0.9).length() < 1e-6);
        assert!(matches!(d.facing, Facing::Toward { rate, .. } if rate == 240.0));

        stuck.avoidance_direction = heading;
        m.decide(&stuck, &mut rng(), || {
            calls += 1;
            heading
        });
        assert_eq!(calls, 1);
        m.decide(&stuck, &mut rng(), || {
            calls += 1;
            heading
        });
        // 0.25s elapsed < 0.3s interval
        assert_eq!(calls, 1);
        m.decide(&stuck, &mut rng(), || {
            calls += 1;
            heading
        });
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_stuck_within_grace_keeps_fighting() {
        let mut m = machine(0.5);
        let mut stuck = ctx(Some(7.0));
        stuck.is_stuck = true;
        stuck.stuck_duration = 0.5;
        assert_eq!(
            m.decide(&stuck, &mut rng(), no_replan).state,
            CombatState::Sidestepping
        );
    }

    #[test]
    fn test_bypass_faces_avoidance() {
        let mut m = machine(0.5);
        let mut blocked = ctx(Some(12.0));
        blocked.heading_blocked = true;
        let heading = from_yaw(-45.0);
        let d = m.decide(&blocked, &mut rng(), || heading);
        assert_eq!(d.state, CombatState::Bypassing);
        assert!((d.movement - heading * 0.8).length() < 1e-6);
        match d.facing {
            Facing::Toward { direction, rate } => {
                assert!((yaw_of(direction) + 45.0).abs() < 1e-3);
                assert_eq!(rate, 120.0);
            }
            other => panic!("unexpected facing {other:?}"),
        }
    }
}
