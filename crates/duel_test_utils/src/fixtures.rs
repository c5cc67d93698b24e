//! Test fixtures and helpers.
//!
//! Pre-built arenas and a single-agent harness with a static opponent for
//! consistent testing.

use duel_core::agent::{Agent, Environment, PolicyAction};
use duel_core::body::{FreeBody, Pose};
use duel_core::config::{AgentConfig, RewardConfig};
use duel_core::error::DuelError;
use duel_core::events::EventLog;
use duel_core::geometry::AgentId;
use duel_core::registry::{OpponentSnapshot, RoleRegistry};
use duel_core::shapes::{Aabb, ColliderSet, Cylinder};
use glam::Vec3;

use crate::determinism::{DeterministicSim, SnapshotSim};

/// Default fixed timestep (50 Hz).
pub const DT: f32 = 0.02;
/// Agent body radius.
pub const BODY_RADIUS: f32 = 0.5;
/// Agent body height.
pub const BODY_HEIGHT: f32 = 1.8;
/// Id of the agent under test.
pub const SUBJECT: AgentId = AgentId(1);
/// Id of the static opponent.
pub const OPPONENT: AgentId = AgentId(2);

/// Agent body standing at `position`.
#[must_use]
pub fn body(position: Vec3) -> Cylinder {
    Cylinder::new(position, BODY_RADIUS, BODY_HEIGHT)
}

/// Flat floor, no walls.
#[must_use]
pub fn open_ground() -> ColliderSet {
    ColliderSet::with_ground()
}

/// Floor enclosed by four walls, `half` units from the origin on each axis.
#[must_use]
pub fn walled_arena(half: f32) -> ColliderSet {
    let t = 0.5;
    let h = 3.0;
    open_ground()
        .wall(Aabb::new(Vec3::new(-half - t, 0.0, -half - t), Vec3::new(half + t, h, -half)))
        .wall(Aabb::new(Vec3::new(-half - t, 0.0, half), Vec3::new(half + t, h, half + t)))
        .wall(Aabb::new(Vec3::new(-half - t, 0.0, -half), Vec3::new(-half, h, half)))
        .wall(Aabb::new(Vec3::new(half, 0.0, -half), Vec3::new(half + t, h, half)))
}

/// One agent ticking against an opponent that never moves.
pub struct AgentFixture {
    /// Agent under test.
    pub agent: Agent<EventLog>,
    /// Colliders, including both bodies.
    pub world: ColliderSet,
    /// Opponent lookup.
    pub roster: RoleRegistry,
    /// The subject's body.
    pub body: FreeBody,
    /// Tick length.
    pub dt: f32,
    /// Policy actions replayed in a loop; scripted when empty.
    pub policy: Vec<PolicyAction>,
}

impl AgentFixture {
    /// Subject at `subject` facing +Z, opponent at `opponent` facing the
    /// subject, inside a 20-unit walled arena.
    #[must_use]
    pub fn new(subject: Vec3, opponent: Vec3) -> Self {
        let subject_pose = Pose::new(subject, Vec3::Z);
        let opponent_pose = Pose::new(opponent, subject - opponent);
        let config = AgentConfig::default();
        let eye = config.sensing.eye_height;

        let mut roster = RoleRegistry::new();
        roster.register(0, OpponentSnapshot::new(SUBJECT, subject_pose, eye));
        roster.register(1, OpponentSnapshot::new(OPPONENT, opponent_pose, eye));

        let world = walled_arena(20.0)
            .agent(SUBJECT, body(subject))
            .agent(OPPONENT, body(opponent));

        Self {
            agent: Agent::new(SUBJECT, subject_pose, config, RewardConfig::default())
                .with_sink(EventLog::new()),
            world,
            roster,
            body: FreeBody::default(),
            dt: DT,
            policy: Vec::new(),
        }
    }

    /// Subject at the origin, opponent `distance` units straight ahead.
    #[must_use]
    pub fn facing_off(distance: f32) -> Self {
        Self::new(Vec3::ZERO, Vec3::new(0.0, 0.0, distance))
    }

    /// Opponent 7 units ahead behind a wide wall 2 units in front.
    #[must_use]
    pub fn behind_wall() -> Self {
        let mut fixture = Self::facing_off(7.0);
        fixture.world = fixture
            .world
            .wall(Aabb::new(Vec3::new(-5.0, 0.0, 2.0), Vec3::new(5.0, 3.0, 2.5)));
        fixture
    }

    /// Subject with nobody to fight.
    #[must_use]
    pub fn alone() -> Self {
        let mut fixture = Self::facing_off(7.0);
        fixture.roster.remove(OPPONENT);
        fixture.world.agents.retain(|(id, _)| *id != OPPONENT);
        fixture
    }

    /// Replace the tick length.
    #[must_use]
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Drive the subject with a looping policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Vec<PolicyAction>) -> Self {
        self.policy = policy;
        self
    }

    /// Rebuild the subject with a different configuration.
    #[must_use]
    pub fn with_agent_config(mut self, config: AgentConfig) -> Self {
        let reward = self.agent.shaper().config().clone();
        self.agent = Agent::new(SUBJECT, self.agent.spawn_pose(), config, reward)
            .with_sink(EventLog::new());
        self
    }

    /// Reseed the subject's personality.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.agent = self.agent.with_seed(seed);
        self
    }

    /// Run `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Push the subject's pose into the colliders and roster.
    pub fn sync(&mut self) {
        let snapshot = self.agent.public_snapshot();
        self.world.set_agent(SUBJECT, body(snapshot.pose.position));
        self.roster.publish(snapshot);
    }
}

impl DeterministicSim for AgentFixture {
    fn step(&mut self) {
        let action = if self.policy.is_empty() {
            None
        } else {
            let index = (self.agent.tick_count() % self.policy.len() as u64) as usize;
            self.policy.get(index).copied()
        };
        let env = Environment::new(&self.world, &self.roster);
        self.agent.tick(self.dt, &env, &mut self.body, action.as_ref());
        self.sync();
    }

    fn state_hash(&self) -> u64 {
        self.agent.state_hash()
    }
}

impl SnapshotSim for AgentFixture {
    type Error = DuelError;

    fn save(&self) -> Result<Vec<u8>, DuelError> {
        self.agent.snapshot()
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<(), DuelError> {
        self.agent.restore(bytes)?;
        self.sync();
        Ok(())
    }
}
