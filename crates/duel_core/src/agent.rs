//! The duel agent.
//!
//! [`Agent`] owns every per-agent component and runs them in a fixed order
//! each tick:
//!
//! 1. opponent lookup (cached id, slow re-probe while absent)
//! 2. sensing
//! 3. stuck sampling, replanning avoidance on Stuck
//! 4. decision (scripted state machine, optionally overridden by a policy)
//! 5. fire / dash, facing, locomotion through the host body
//! 6. timers
//! 7. reward
//!
//! The agent never panics or errors during a tick; degenerate inputs are
//! clamped or replaced with safe defaults.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::avoidance::AvoidancePlanner;
use crate::body::{MotionBody, Pose};
use crate::config::{AgentConfig, RewardConfig};
use crate::counters::ExposureCounters;
use crate::error::{DuelError, Result};
use crate::events::{CombatEventSink, FireCommand, NullSink};
use crate::geometry::{AgentId, GeometryQuery, LayerMask};
use crate::locomotion::{Locomotion, MotionInput};
use crate::math::{
    direction_between, finite_or, planar_distance, rotate_towards, rotate_yaw, UP,
};
use crate::observation::Observation;
use crate::registry::{OpponentSnapshot, Roster};
use crate::reward::{
    Engagement, EpisodeReturn, RewardBreakdown, RewardInputs, RewardShaper, TerminalEvent,
};
use crate::sensing::{FanCoverage, SensingSnapshot, SensorArray};
use crate::smoothing::ActionSmoother;
use crate::state_machine::{
    CombatState, CombatStateMachine, DecisionContext, Facing, MachineConfig, TargetView,
};
use crate::stuck::{StuckDetector, StuckPhase, StuckState};
use crate::timers::CombatTimers;

/// Personality seed derived from a spawn position.
#[must_use]
pub fn spawn_seed(position: Vec3) -> u64 {
    let mixed = (position.x * 1000.0 + position.z * 1000.0).round();
    if mixed.is_finite() {
        // Two's complement keeps negative spawns distinct.
        (mixed as i64) as u64
    } else {
        0
    }
}

/// Discrete turn intent of an external policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotate {
    /// Keep facing.
    #[default]
    None,
    /// Turn counter-clockwise seen from above.
    Left,
    /// Turn clockwise seen from above.
    Right,
}

/// Action emitted by an external (learned) policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyAction {
    /// Movement along world X, in `[-1, 1]`.
    pub move_x: f32,
    /// Movement along world Z, in `[-1, 1]`.
    pub move_z: f32,
    /// Turn intent.
    pub rotate: Rotate,
    /// Fire if loaded.
    pub shoot: bool,
    /// Dash if ready.
    pub dash: bool,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Agent tick counter after this tick.
    pub tick: u64,
    /// Movement state chosen this tick.
    pub state: CombatState,
    /// Smoothed movement request handed to locomotion.
    pub movement: Vec3,
    /// Displacement the body actually applied.
    pub displacement: Vec3,
    /// Facing after this tick.
    pub forward: Vec3,
    /// Projectile launched this tick.
    pub shot: Option<FireCommand>,
    /// A dash started this tick.
    pub dashed: bool,
    /// Shaping reward of this tick.
    pub reward: RewardBreakdown,
}

/// Host-provided world access for one tick.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// Colliders.
    pub geometry: &'a dyn GeometryQuery,
    /// Opponent lookup.
    pub roster: &'a dyn Roster,
}

impl<'a> Environment<'a> {
    /// Bundle a geometry and a roster.
    #[must_use]
    pub fn new(geometry: &'a dyn GeometryQuery, roster: &'a dyn Roster) -> Self {
        Self { geometry, roster }
    }
}

/// Serializable per-agent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AgentState {
    pose: Pose,
    spawn: Pose,
    initialized: bool,
    alive: bool,
    tick: u64,
    seed: u64,
    rng: ChaCha8Rng,
    opponent: Option<AgentId>,
    search_elapsed: f32,
    locomotion: Locomotion,
    timers: CombatTimers,
    counters: ExposureCounters,
    stuck: StuckDetector,
    smoother: ActionSmoother,
    machine: CombatStateMachine,
    sensing: SensingSnapshot,
    last_reward: RewardBreakdown,
    episode: EpisodeReturn,
}

/// Autonomous duel agent.
pub struct Agent<S = NullSink> {
    id: AgentId,
    config: AgentConfig,
    sensor: SensorArray,
    planner: AvoidancePlanner,
    shaper: RewardShaper,
    state: AgentState,
    sink: S,
}

impl Agent<NullSink> {
    /// Agent at `spawn`, seeded from the spawn position.
    #[must_use]
    pub fn new(id: AgentId, spawn: Pose, config: AgentConfig, reward: RewardConfig) -> Self {
        let seed = spawn_seed(spawn.position);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bias = rng.gen_range(-1.0f32..=1.0);
        let machine = CombatStateMachine::new(
            MachineConfig::new(
                config.behavior.clone(),
                config.stuck.clone(),
                &config.combat,
                &config.movement,
            ),
            bias,
        );
        let state = AgentState {
            pose: spawn,
            spawn,
            initialized: false,
            alive: true,
            tick: 0,
            seed,
            rng,
            opponent: None,
            search_elapsed: 0.0,
            locomotion: Locomotion::new(config.movement.clone(), config.combat.dash_speed),
            timers: CombatTimers::new(),
            counters: ExposureCounters::default(),
            stuck: StuckDetector::new(config.stuck.clone(), spawn.position),
            smoother: ActionSmoother::new(config.smoothing.clone()),
            machine,
            sensing: SensingSnapshot::default(),
            last_reward: RewardBreakdown::default(),
            episode: EpisodeReturn::default(),
        };
        Self {
            id,
            sensor: SensorArray::new(id, config.sensing.clone()),
            planner: AvoidancePlanner::new(config.avoidance.clone(), config.sensing.eye_height),
            shaper: RewardShaper::new(reward),
            config,
            state,
            sink: NullSink,
        }
    }
}

impl<S: CombatEventSink> Agent<S> {
    /// Replace the personality seed (and the bias drawn from it).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bias = rng.gen_range(-1.0f32..=1.0);
        self.state.seed = seed;
        self.state.rng = rng;
        self.state.machine = CombatStateMachine::new(
            MachineConfig::new(
                self.config.behavior.clone(),
                self.config.stuck.clone(),
                &self.config.combat,
                &self.config.movement,
            ),
            bias,
        );
        self
    }

    /// Attach an event sink.
    #[must_use]
    pub fn with_sink<T: CombatEventSink>(self, sink: T) -> Agent<T> {
        Agent {
            id: self.id,
            config: self.config,
            sensor: self.sensor,
            planner: self.planner,
            shaper: self.shaper,
            state: self.state,
            sink,
        }
    }

    /// Agent id.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Reward calculator.
    #[must_use]
    pub fn shaper(&self) -> &RewardShaper {
        &self.shaper
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.state.pose
    }

    /// Overwrite the pose, e.g. after the host teleported the body.
    pub fn set_pose(&mut self, pose: Pose) {
        self.state.pose = Pose::new(finite_or(pose.position, self.state.pose.position), pose.forward);
    }

    /// Spawn pose captured at initialization.
    #[must_use]
    pub fn spawn_pose(&self) -> Pose {
        self.state.spawn
    }

    /// Personality seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.state.seed
    }

    /// Personality bias in `[-1, 1]`.
    #[must_use]
    pub fn bias(&self) -> f32 {
        self.state.machine.bias()
    }

    /// Whether the agent is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    /// Mark the agent alive or dead; dead agents skip their ticks.
    pub fn set_alive(&mut self, alive: bool) {
        self.state.alive = alive;
    }

    /// Number of ticks run.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.state.tick
    }

    /// Current movement state.
    #[must_use]
    pub fn combat_state(&self) -> CombatState {
        self.state.machine.state()
    }

    /// Resource timers.
    #[must_use]
    pub fn timers(&self) -> &CombatTimers {
        &self.state.timers
    }

    /// Exposure counters.
    #[must_use]
    pub fn counters(&self) -> &ExposureCounters {
        &self.state.counters
    }

    /// Stuck detector state.
    #[must_use]
    pub fn stuck_state(&self) -> &StuckState {
        self.state.stuck.state()
    }

    /// Last sensing pass.
    #[must_use]
    pub fn sensing(&self) -> &SensingSnapshot {
        &self.state.sensing
    }

    /// Horizontal speed.
    #[must_use]
    pub fn horizontal_speed(&self) -> f32 {
        self.state.locomotion.horizontal_speed()
    }

    /// Opponent id, if resolved.
    #[must_use]
    pub fn opponent(&self) -> Option<AgentId> {
        self.state.opponent
    }

    /// Shaping reward of the last tick.
    #[must_use]
    pub fn last_reward(&self) -> &RewardBreakdown {
        &self.state.last_reward
    }

    /// Current episode return.
    #[must_use]
    pub fn episode(&self) -> &EpisodeReturn {
        &self.state.episode
    }

    /// Read and clear the reward gathered since the last call.
    pub fn take_step_reward(&mut self) -> f32 {
        self.state.episode.take_step()
    }

    /// Start a new episode.
    pub fn reset_episode(&mut self) {
        self.state.episode.reset();
    }

    /// Event sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Event sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Snapshot other agents read at the start of their tick.
    #[must_use]
    pub fn public_snapshot(&self) -> OpponentSnapshot {
        OpponentSnapshot {
            id: self.id,
            pose: self.state.pose,
            eye_height: self.config.sensing.eye_height,
            alive: self.state.alive,
        }
    }

    /// Capture the spawn pose (first call only) and resolve the opponent.
    pub fn initialize(&mut self, roster: &dyn Roster) {
        if !self.state.initialized {
            self.state.spawn = self.state.pose;
            self.state.initialized = true;
            self.state.stuck.reset(self.state.pose.position);
            tracing::debug!(agent = %self.id, seed = self.state.seed, bias = self.bias(), "Agent initialized");
        }
        if self.state.opponent.is_none() {
            self.state.opponent = roster.resolve_opponent(self.id);
            if let Some(opponent) = self.state.opponent {
                tracing::debug!(agent = %self.id, opponent = %opponent, "Opponent acquired");
            }
        }
    }

    /// Run one fixed-timestep tick.
    ///
    /// With `policy` present its action replaces the scripted movement,
    /// turning, fire and dash intents; sensing, timers and rewards run
    /// unchanged.
    pub fn tick(
        &mut self,
        dt: f32,
        env: &Environment<'_>,
        body: &mut dyn MotionBody,
        policy: Option<&PolicyAction>,
    ) -> TickReport {
        if !self.state.initialized {
            self.initialize(env.roster);
        }
        if !dt.is_finite() || dt <= 0.0 {
            tracing::warn!(agent = %self.id, dt, "Ignoring tick with invalid timestep");
            return self.idle_report();
        }
        if !self.state.alive {
            return self.idle_report();
        }
        self.state.tick += 1;

        let opponent = self.refresh_opponent(env.roster, dt);
        let pose = self.state.pose;

        self.state.sensing = self.sensor.sense(&pose, opponent.as_ref(), env.geometry);
        let range = self.sensor.config().range;
        let snapshot = &self.state.sensing;
        let target = opponent
            .zip(snapshot.target)
            .filter(|(_, contact)| contact.distance <= range)
            .map(|(o, contact)| TargetView {
                distance: contact.distance,
                direction: direction_between(pose.position, o.pose.position, pose.forward),
                // A fan ray already landed on the opponent; otherwise cast toward its eye.
                in_sight: snapshot.target_visible || self.sensor.can_see(&pose, &o, env.geometry),
            });

        if let Some(sample) = self.state.stuck.update(pose.position, dt) {
            if sample.phase == StuckPhase::Stuck {
                let heading = self.planner.plan(&pose, env.geometry);
                self.state.stuck.set_avoidance_direction(heading);
            }
        }

        let heading_blocked = target.is_some_and(|t| {
            self.planner
                .is_blocked(&pose, t.direction, t.distance, env.geometry)
        });

        let ctx = DecisionContext {
            dt,
            forward: pose.forward,
            target,
            heading_blocked,
            is_stuck: self.state.stuck.is_stuck(),
            stuck_duration: self.state.stuck.stuck_duration(),
            avoidance_direction: self.state.stuck.avoidance_direction(),
            timers: self.state.timers,
        };
        let previous = self.state.machine.state();
        let planner = &self.planner;
        let geometry = env.geometry;
        let mut decision =
            self.state
                .machine
                .decide(&ctx, &mut self.state.rng, || planner.plan(&pose, geometry));
        if let Some(heading) = decision.replanned {
            self.state.stuck.set_avoidance_direction(heading);
        }
        if decision.state != previous {
            self.sink.on_state_changed(self.id, previous, decision.state);
        }

        if let Some(action) = policy {
            let rate = self.config.movement.policy_turn_rate;
            decision.movement = Vec3::new(action.move_x, 0.0, action.move_z);
            decision.facing = match action.rotate {
                Rotate::None => Facing::Hold,
                Rotate::Left => Facing::Spin { rate: -rate },
                Rotate::Right => Facing::Spin { rate },
            };
            decision.fire = action.shoot;
            decision.dash = action.dash;
        }

        let shot = if decision.fire {
            self.fire(&pose)
        } else {
            None
        };
        let combat = &self.config.combat;
        let dashed = decision.dash
            && self
                .state
                .timers
                .start_dash(combat.dash_duration, combat.dash_cooldown);
        if dashed {
            tracing::debug!(agent = %self.id, "Dash started");
            self.sink.on_dash(self.id);
        }

        let forward = match decision.facing {
            Facing::Toward { direction, rate } => rotate_towards(pose.forward, direction, rate * dt),
            Facing::Spin { rate } => rotate_yaw(pose.forward, rate * dt),
            Facing::Hold => pose.forward,
        };

        let movement = self.state.smoother.filter(decision.movement, dt);
        let m = &self.config.movement;
        let grounded = env.geometry.overlap_sphere(
            pose.position + UP * m.ground_probe_height,
            m.ground_probe_radius,
            LayerMask::GROUND,
        );
        let wanted = self.state.locomotion.step(
            &MotionInput {
                request: movement,
                forward,
                dashing: self.state.timers.is_dashing(),
                reloading: self.state.timers.is_reloading(),
                grounded,
            },
            dt,
        );
        let resolved = finite_or(body.move_by(pose.position, wanted), pose.position);
        let displacement = resolved - pose.position;
        self.state.locomotion.observe(displacement, dt);
        self.state.pose = Pose::new(resolved, forward);

        let expiries = self.state.timers.advance(dt);
        if expiries.reload_completed {
            tracing::trace!(agent = %self.id, "Reload complete");
        }

        let reward = self.score(dt, opponent.as_ref(), env.geometry);
        self.state.episode.add_tick(&reward);
        self.state.last_reward = reward;

        #[cfg(feature = "debug-validation")]
        self.check_invariants();

        TickReport {
            tick: self.state.tick,
            state: decision.state,
            movement,
            displacement,
            forward,
            shot,
            dashed,
            reward,
        }
    }

    fn refresh_opponent(&mut self, roster: &dyn Roster, dt: f32) -> Option<OpponentSnapshot> {
        if let Some(id) = self.state.opponent {
            if let Some(snapshot) = roster.snapshot(id) {
                return Some(snapshot);
            }
            tracing::debug!(agent = %self.id, opponent = %id, "Opponent lost");
            self.state.opponent = None;
            self.state.search_elapsed = 0.0;
        }

        self.state.search_elapsed += dt;
        if self.state.search_elapsed < self.config.behavior.search_interval {
            return None;
        }
        self.state.search_elapsed = 0.0;
        let id = roster.resolve_opponent(self.id)?;
        tracing::debug!(agent = %self.id, opponent = %id, "Opponent acquired");
        self.state.opponent = Some(id);
        roster.snapshot(id)
    }

    fn fire(&mut self, pose: &Pose) -> Option<FireCommand> {
        if !self.state.timers.can_fire() {
            return None;
        }
        let weapon = self.config.combat.weapon.as_ref()?;
        let shot = FireCommand {
            origin: pose.position + pose.forward * weapon.muzzle_forward + UP * weapon.muzzle_height,
            direction: pose.forward,
            speed: weapon.projectile_speed,
        };
        self.state.timers.start_reload(self.config.combat.reload_time);
        self.state.counters.on_shot_fired();
        self.state.machine.notify_shot();
        tracing::debug!(agent = %self.id, tick = self.state.tick, "Shot fired");
        self.sink.on_shot_fired(self.id, &shot);
        Some(shot)
    }

    fn score<G: GeometryQuery + ?Sized>(
        &mut self,
        dt: f32,
        opponent: Option<&OpponentSnapshot>,
        geometry: &G,
    ) -> RewardBreakdown {
        let pose = self.state.pose;
        self.state.counters.advance(dt);

        let engagement = opponent.map(|o| {
            let in_sight = self.sensor.can_see(&pose, o, geometry);
            Engagement {
                distance: planar_distance(pose.position, o.pose.position),
                aim_alignment: pose
                    .forward
                    .dot(direction_between(pose.position, o.pose.position, pose.forward)),
                in_sight,
                seen_by_opponent: self.sensor.is_seen_by(&pose, o, geometry),
            }
        });
        if engagement.is_some_and(|e| e.in_sight) {
            self.state.counters.on_target_visible();
        }

        let near_wall = SensorArray::is_near_wall(
            pose.position,
            self.shaper.config().wall_near_radius,
            geometry,
        );
        self.state.counters.observe_wall(near_wall, dt);

        self.shaper.score(&RewardInputs {
            dt,
            engagement,
            counters: self.state.counters,
            near_wall,
            forward_wall_distance: self.sensor.forward_wall_distance(&pose, geometry),
            is_stuck: self.state.stuck.is_stuck(),
            stuck_duration: self.state.stuck.stuck_duration(),
        })
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        let t = &self.state.timers;
        assert!(
            t.dash_remaining >= 0.0 && t.dash_cooldown_remaining >= 0.0 && t.reload_remaining >= 0.0,
            "negative combat timer: {t:?}"
        );
        assert!(self.state.pose.position.is_finite(), "non-finite position");
        assert!(
            (self.state.pose.forward.length() - 1.0).abs() < 1e-3,
            "facing is not unit length"
        );
    }

    fn idle_report(&self) -> TickReport {
        TickReport {
            tick: self.state.tick,
            state: self.state.machine.state(),
            movement: Vec3::ZERO,
            displacement: Vec3::ZERO,
            forward: self.state.pose.forward,
            shot: None,
            dashed: false,
            reward: RewardBreakdown::default(),
        }
    }

    /// Return to the spawn pose with fresh timers and counters.
    ///
    /// Collision is disabled on the body while the pose is written. The
    /// opponent link, personality and episode return are kept.
    pub fn respawn(&mut self, body: &mut dyn MotionBody) {
        if !self.state.initialized {
            self.state.spawn = self.state.pose;
            self.state.initialized = true;
        }
        let spawn = self.state.spawn;
        body.set_collision_enabled(false);
        body.teleport(spawn);
        self.state.pose = spawn;
        body.set_collision_enabled(true);

        self.state.alive = true;
        self.state.search_elapsed = 0.0;
        self.state.locomotion.reset();
        self.state.timers.reset();
        self.state.counters.reset();
        self.state.stuck.reset(spawn.position);
        self.state.smoother.reset();
        self.state.machine.reset();
        self.state.sensing = SensingSnapshot::default();
        self.state.last_reward = RewardBreakdown::default();

        tracing::debug!(agent = %self.id, x = spawn.position.x, z = spawn.position.z, "Agent respawned");
        self.sink.on_respawn(self.id);
    }

    /// This agent was struck: terminal penalty, then respawn.
    pub fn on_hit(&mut self, body: &mut dyn MotionBody) -> f32 {
        let reward = self.shaper.terminal(TerminalEvent::HitTaken);
        self.state.episode.add(reward);
        tracing::debug!(agent = %self.id, reward, "Hit taken");
        self.sink.on_hit(self.id);
        self.respawn(body);
        reward
    }

    /// This agent's projectile struck the opponent: terminal reward, then
    /// respawn.
    pub fn on_opponent_hit(&mut self, body: &mut dyn MotionBody) -> f32 {
        let reward = self.shaper.terminal(TerminalEvent::HitLanded);
        self.state.episode.add(reward);
        self.state.counters.on_hit_landed();
        self.state.machine.clear_post_shot();
        tracing::debug!(agent = %self.id, reward, "Hit landed");
        self.sink.on_hit_landed(self.id);
        self.respawn(body);
        reward
    }

    /// A projectile passed close by without hitting.
    pub fn on_shot_dodged(&mut self) -> f32 {
        let reward = self.shaper.terminal(TerminalEvent::Dodged);
        self.state.episode.add(reward);
        tracing::debug!(agent = %self.id, reward, "Shot dodged");
        self.sink.on_dodge(self.id);
        reward
    }

    /// Build the observation vector for a learned policy.
    pub fn observe(&self, env: &Environment<'_>) -> Observation {
        let pose = self.state.pose;
        let sensing = self.sensor.config();
        let opponent = self
            .state
            .opponent
            .and_then(|id| env.roster.snapshot(id));
        let direction = opponent
            .map(|o| direction_between(pose.position, o.pose.position, pose.forward));
        let wall_rays = self
            .sensor
            .sense_walls(
                &pose,
                FanCoverage::FullCircle,
                sensing.observation_ray_count,
                sensing.range,
                env.geometry,
            )
            .into_iter()
            .map(|r| r.normalized_distance)
            .collect();

        Observation {
            position: pose.position,
            forward: pose.forward,
            opponent_position: opponent.map(|o| o.pose.position),
            opponent_direction: direction,
            can_fire: self.state.timers.can_fire(),
            reloading: self.state.timers.is_reloading(),
            dashing: self.state.timers.is_dashing(),
            dash_cooldown: self
                .state
                .timers
                .cooldown_fraction(self.config.combat.dash_cooldown),
            wall_rays,
            opponent_distance: opponent.map_or(1.0, |o| {
                (planar_distance(pose.position, o.pose.position) / sensing.range).clamp(0.0, 1.0)
            }),
            aim_alignment: direction.map_or(0.0, |d| pose.forward.dot(d)),
        }
    }

    /// Hash of the complete mutable state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let s = &self.state;
        let mut bits = Vec::with_capacity(64);
        bits.extend(s.pose.bits());
        bits.extend(s.spawn.bits());
        bits.push(u32::from(s.initialized));
        bits.push(u32::from(s.alive));
        bits.push(s.opponent.map_or(u32::MAX, |id| id.0));
        bits.push(s.search_elapsed.to_bits());
        s.locomotion.hash_into(&mut bits);
        s.timers.hash_into(&mut bits);
        s.counters.hash_into(&mut bits);
        s.stuck.state().hash_into(&mut bits);
        s.smoother.hash_into(&mut bits);
        s.machine.hash_into(&mut bits);
        bits.push(s.episode.total.to_bits());

        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        s.tick.hash(&mut hasher);
        s.seed.hash(&mut hasher);
        s.rng.get_word_pos().hash(&mut hasher);
        bits.hash(&mut hasher);
        hasher.finish()
    }

    /// Encode the mutable state.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.state).map_err(|e| DuelError::Snapshot(e.to_string()))
    }

    /// Replace the mutable state with a decoded snapshot.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        self.state = bincode::deserialize(bytes).map_err(|e| DuelError::Snapshot(e.to_string()))?;
        Ok(())
    }
}
