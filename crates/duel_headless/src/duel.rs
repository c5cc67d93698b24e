//! Two-agent duel match.
//!
//! Each tick the contestants run in a fixed order. After an agent ticks its
//! body and registry snapshot are republished, so the second agent reads the
//! first one's new pose. Fire events become projectiles, projectiles resolve
//! hits and near misses, and the round clock advances.
//!
//! A hit respawns both agents. A round ends on time: episode returns are
//! recorded and reset, both agents respawn and stray projectiles are
//! cleared. The match ends when a contestant reaches the score target or
//! the last round runs out.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use duel_core::agent::{Agent, Environment, PolicyAction};
use duel_core::body::Pose;
use duel_core::events::{CombatEvent, EventLog};
use duel_core::geometry::AgentId;
use duel_core::math::from_yaw;
use duel_core::observation::Observation;
use duel_core::registry::RoleRegistry;
use duel_core::shapes::{Aabb, ColliderSet, Cylinder};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::kinematic::SlideBody;
use crate::metrics::{MatchMetrics, MetricsCollector};
use crate::projectile::{Projectile, ProjectileOutcome};
use crate::scenario::{Scenario, ScenarioError, SpawnPoint};

const SPAWN_ATTEMPTS: usize = 16;

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// A contestant reached the score target.
    ScoreTarget,
    /// The last round ran out.
    RoundLimit,
    /// The caller's tick budget ran out.
    TickLimit,
}

impl EndCondition {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScoreTarget => "score_target",
            Self::RoundLimit => "round_limit",
            Self::TickLimit => "tick_limit",
        }
    }
}

/// Final result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Index of the winning contestant, `None` on a draw.
    pub winner: Option<usize>,
    /// Why the match ended.
    pub condition: EndCondition,
    /// Tick on which it ended.
    pub tick: u64,
}

/// A hit resolved during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRecord {
    /// Index of the shooter.
    pub shooter: usize,
    /// Index of the struck contestant.
    pub victim: usize,
}

/// What happened during one match step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Projectiles launched, by contestant index.
    pub shots: Vec<usize>,
    /// Hits resolved.
    pub hits: Vec<HitRecord>,
    /// Near misses, by dodging contestant index.
    pub dodges: Vec<usize>,
    /// Whether a round ended this step.
    pub round_ended: bool,
}

/// One side of the duel.
pub struct Contestant {
    /// Name from the spawn point.
    pub name: String,
    /// Team in the role registry.
    pub team: u8,
    /// The agent.
    pub agent: Agent<EventLog>,
    /// Its kinematic body.
    pub body: SlideBody,
    /// Hits landed this match.
    pub score: u32,
}

impl Contestant {
    /// Agent id.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.agent.id()
    }
}

/// A running duel.
pub struct DuelMatch {
    scenario: Scenario,
    seed: u64,
    contestants: Vec<Contestant>,
    world: ColliderSet,
    roster: RoleRegistry,
    projectiles: Vec<Projectile>,
    metrics: MetricsCollector,
    tick: u64,
    round: u32,
    round_tick: u64,
    round_ticks: u64,
    outcome: Option<MatchOutcome>,
}

fn jittered_spawn(spawn: &SpawnPoint, scenario: &Scenario, rng: &mut ChaCha8Rng) -> Pose {
    let jitter = scenario.rules.spawn_jitter;
    let mut position = spawn.position;
    if jitter > 0.0 {
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = spawn.position
                + Vec3::new(
                    rng.gen_range(-jitter..=jitter),
                    0.0,
                    rng.gen_range(-jitter..=jitter),
                );
            if scenario.arena.is_clear(candidate, scenario.body.radius) {
                position = candidate;
                break;
            }
        }
    }
    let yaw = if scenario.rules.random_facing {
        rng.gen_range(0.0..360.0)
    } else {
        spawn.yaw
    };
    Pose::new(position, from_yaw(yaw))
}

impl DuelMatch {
    /// Start a match. The seed drives spawn placement and, through the
    /// spawn positions, each agent's personality.
    pub fn new(scenario: Scenario, seed: u64) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let walls: Arc<[Aabb]> = scenario.arena.walls().into();
        let mut world = scenario.arena.colliders();
        let mut roster = RoleRegistry::new();
        let mut metrics = MetricsCollector::new(
            &format!("{}_{seed}", scenario.name),
            &scenario.name,
            seed,
        );

        let mut contestants = Vec::with_capacity(scenario.spawns.len());
        for (index, spawn) in scenario.spawns.iter().enumerate() {
            let id = AgentId(index as u32 + 1);
            let team = index as u8;
            let pose = jittered_spawn(spawn, &scenario, &mut rng);
            let agent = Agent::new(
                id,
                pose,
                scenario.duel.agent.clone(),
                scenario.duel.reward.clone(),
            )
            .with_sink(EventLog::new());

            world.set_agent(
                id,
                Cylinder::new(pose.position, scenario.body.radius, scenario.body.height),
            );
            roster.register(team, agent.public_snapshot());
            metrics.register(&spawn.name);

            contestants.push(Contestant {
                name: spawn.name.clone(),
                team,
                agent,
                body: SlideBody::new(Arc::clone(&walls), scenario.body.radius, scenario.body.height),
                score: 0,
            });
        }

        tracing::debug!(scenario = %scenario.name, seed, "Match created");

        let round_ticks = scenario.round_ticks();
        Ok(Self {
            scenario,
            seed,
            contestants,
            world,
            roster,
            projectiles: Vec::new(),
            metrics,
            tick: 0,
            round: 1,
            round_tick: 0,
            round_ticks,
            outcome: None,
        })
    }

    /// Scenario being played.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Seed the match was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Both contestants, in tick order.
    #[must_use]
    pub fn contestants(&self) -> &[Contestant] {
        &self.contestants
    }

    /// Mutable access to one contestant.
    pub fn contestant_mut(&mut self, index: usize) -> Option<&mut Contestant> {
        self.contestants.get_mut(index)
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Current colliders, including agent bodies.
    #[must_use]
    pub fn world(&self) -> &ColliderSet {
        &self.world
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current round, starting at 1.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Seconds left in the current round.
    #[must_use]
    pub fn round_time_left(&self) -> f32 {
        self.round_ticks.saturating_sub(self.round_tick) as f32 * self.scenario.duel.tick_seconds
    }

    /// Final result, once the match is over.
    #[must_use]
    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the match is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Metrics gathered so far.
    #[must_use]
    pub fn metrics(&self) -> &MatchMetrics {
        self.metrics.current()
    }

    /// Observation vector of contestant `index`.
    #[must_use]
    pub fn observe(&self, index: usize) -> Option<Observation> {
        let contestant = self.contestants.get(index)?;
        let env = Environment::new(&self.world, &self.roster);
        Some(contestant.agent.observe(&env))
    }

    /// Advance one tick. `actions[i]`, when present, drives contestant `i`
    /// through its policy override; the rest follow their scripted logic.
    pub fn step(&mut self, actions: &[Option<PolicyAction>]) -> StepSummary {
        let mut summary = StepSummary::default();
        if self.outcome.is_some() {
            return summary;
        }
        let dt = self.scenario.duel.tick_seconds;

        for index in 0..self.contestants.len() {
            let action = actions.get(index).copied().flatten();
            self.tick_contestant(index, dt, action.as_ref());
        }

        self.collect_events(&mut summary);
        self.advance_projectiles(dt, &mut summary);

        self.tick += 1;
        self.round_tick += 1;
        self.metrics.set_tick(self.tick);

        if let Some(leader) = self.leader_at_target() {
            self.finish(Some(leader), EndCondition::ScoreTarget);
        } else if self.round_tick >= self.round_ticks {
            summary.round_ended = true;
            self.end_round();
        }
        summary
    }

    /// Step with scripted control until the match ends or `max_ticks` total
    /// ticks have run.
    pub fn run_to_end(&mut self, max_ticks: u64) -> MatchOutcome {
        while self.outcome.is_none() && self.tick < max_ticks {
            self.step(&[]);
        }
        if self.outcome.is_none() {
            let leader = self.leader();
            self.finish(leader, EndCondition::TickLimit);
        }
        self.outcome.clone().unwrap_or(MatchOutcome {
            winner: None,
            condition: EndCondition::TickLimit,
            tick: self.tick,
        })
    }

    /// Hash of the complete match state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.round.hash(&mut hasher);
        self.round_tick.hash(&mut hasher);
        for c in &self.contestants {
            c.score.hash(&mut hasher);
            c.agent.state_hash().hash(&mut hasher);
        }
        for p in &self.projectiles {
            p.bits().hash(&mut hasher);
        }
        self.outcome.as_ref().map(|o| (o.winner, o.tick)).hash(&mut hasher);
        hasher.finish()
    }

    /// Consume the match into its metrics. An unfinished match is closed as
    /// a tick-limit result.
    #[must_use]
    pub fn into_metrics(mut self) -> MatchMetrics {
        if self.outcome.is_none() {
            let leader = self.leader();
            self.finish(leader, EndCondition::TickLimit);
        }
        let hash = self.state_hash();
        let (winner, condition) = match &self.outcome {
            Some(outcome) => (
                outcome
                    .winner
                    .and_then(|i| self.contestants.get(i))
                    .map(|c| c.name.clone()),
                outcome.condition,
            ),
            None => (None, EndCondition::TickLimit),
        };
        self.metrics.finalize(winner, condition.as_str(), hash)
    }

    fn tick_contestant(&mut self, index: usize, dt: f32, action: Option<&PolicyAction>) {
        let Self {
            contestants,
            world,
            roster,
            metrics,
            ..
        } = &mut *self;
        let Some(contestant) = contestants.get_mut(index) else {
            return;
        };

        let env = Environment::new(&*world, &*roster);
        contestant
            .agent
            .tick(dt, &env, &mut contestant.body, action);

        if contestant.agent.stuck_state().is_stuck {
            metrics.on_stuck(&contestant.name, dt);
        }
        self.publish(index);
    }

    /// Push a contestant's pose into the colliders and the registry.
    fn publish(&mut self, index: usize) {
        let Some(contestant) = self.contestants.get(index) else {
            return;
        };
        let snapshot = contestant.agent.public_snapshot();
        self.world.set_agent(
            snapshot.id,
            Cylinder::new(
                snapshot.pose.position,
                self.scenario.body.radius,
                self.scenario.body.height,
            ),
        );
        self.roster.publish(snapshot);
    }

    fn collect_events(&mut self, summary: &mut StepSummary) {
        let ids: Vec<AgentId> = self.contestants.iter().map(Contestant::id).collect();
        for index in 0..self.contestants.len() {
            let events = self.contestants[index].agent.sink_mut().drain();
            for event in events {
                match event {
                    CombatEvent::ShotFired { agent, shot } => {
                        let target = ids.iter().copied().find(|id| *id != agent);
                        self.projectiles.push(Projectile::launch(agent, target, &shot));
                        self.metrics.on_shot(&self.contestants[index].name);
                        summary.shots.push(index);
                    }
                    CombatEvent::Dash { .. } => {
                        self.metrics.on_dash(&self.contestants[index].name);
                    }
                    _ => {}
                }
            }
        }
    }

    fn advance_projectiles(&mut self, dt: f32, summary: &mut StepSummary) {
        let Self {
            projectiles,
            world,
            scenario,
            ..
        } = &mut *self;
        let mut resolved = Vec::new();
        projectiles.retain_mut(|p| {
            let outcome = p.step(dt, world, &scenario.projectiles);
            if outcome != ProjectileOutcome::Flying {
                resolved.push((p.owner, outcome));
            }
            !outcome.is_terminal()
        });

        for (owner, outcome) in resolved {
            match outcome {
                ProjectileOutcome::Hit(victim) => {
                    if let (Some(shooter), Some(victim)) = (self.index_of(owner), self.index_of(victim)) {
                        if shooter != victim {
                            self.resolve_hit(shooter, victim);
                            summary.hits.push(HitRecord { shooter, victim });
                        }
                    }
                }
                ProjectileOutcome::Dodged(agent) => {
                    if let Some(index) = self.index_of(agent) {
                        self.contestants[index].agent.on_shot_dodged();
                        self.metrics.on_dodge(&self.contestants[index].name);
                        summary.dodges.push(index);
                    }
                }
                ProjectileOutcome::Flying | ProjectileOutcome::Blocked | ProjectileOutcome::Expired => {}
            }
        }
    }

    fn resolve_hit(&mut self, shooter: usize, victim: usize) {
        {
            let c = &mut self.contestants[victim];
            c.agent.on_hit(&mut c.body);
        }
        {
            let c = &mut self.contestants[shooter];
            c.agent.on_opponent_hit(&mut c.body);
            c.score += 1;
        }
        self.metrics
            .on_hit(&self.contestants[shooter].name, &self.contestants[victim].name);
        tracing::debug!(
            tick = self.tick,
            shooter = %self.contestants[shooter].name,
            victim = %self.contestants[victim].name,
            score = self.contestants[shooter].score,
            "Hit"
        );
        self.publish(victim);
        self.publish(shooter);
    }

    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.contestants.iter().position(|c| c.id() == id)
    }

    fn leader_at_target(&self) -> Option<usize> {
        let target = self.scenario.rules.score_target;
        self.contestants.iter().position(|c| c.score >= target)
    }

    /// Strictly highest score, `None` on a tie.
    fn leader(&self) -> Option<usize> {
        let best = self.contestants.iter().map(|c| c.score).max()?;
        let mut leaders = self
            .contestants
            .iter()
            .enumerate()
            .filter(|(_, c)| c.score == best);
        match (leaders.next(), leaders.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }

    fn record_round(&mut self) {
        let returns: Vec<(String, f32)> = self
            .contestants
            .iter()
            .map(|c| (c.name.clone(), c.agent.episode().total))
            .collect();
        let borrowed: Vec<(&str, f32)> = returns.iter().map(|(n, r)| (n.as_str(), *r)).collect();
        self.metrics.on_round_end(self.round, &borrowed);
    }

    fn end_round(&mut self) {
        self.record_round();
        tracing::debug!(round = self.round, tick = self.tick, "Round over");

        if self.round >= self.scenario.rules.max_rounds {
            let leader = self.leader();
            self.finish_recorded(leader, EndCondition::RoundLimit);
            return;
        }

        for index in 0..self.contestants.len() {
            let c = &mut self.contestants[index];
            c.agent.reset_episode();
            c.agent.respawn(&mut c.body);
            c.agent.sink_mut().drain();
            self.publish(index);
        }
        self.projectiles.clear();
        self.round += 1;
        self.round_tick = 0;
    }

    fn finish(&mut self, winner: Option<usize>, condition: EndCondition) {
        self.record_round();
        self.finish_recorded(winner, condition);
    }

    fn finish_recorded(&mut self, winner: Option<usize>, condition: EndCondition) {
        tracing::info!(
            scenario = %self.scenario.name,
            seed = self.seed,
            tick = self.tick,
            winner = ?winner.and_then(|i| self.contestants.get(i)).map(|c| c.name.as_str()),
            condition = condition.as_str(),
            "Match over"
        );
        self.outcome = Some(MatchOutcome {
            winner,
            condition,
            tick: self.tick,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_scenario() -> Scenario {
        let mut scenario = Scenario::open_field();
        scenario.rules.spawn_jitter = 0.0;
        scenario
    }

    #[test]
    fn test_new_places_both_agents() {
        let duel = DuelMatch::new(quick_scenario(), 1).unwrap();
        assert_eq!(duel.contestants().len(), 2);
        assert_eq!(duel.world().agents.len(), 2);
        let blue = duel.contestants()[0].agent.pose();
        assert_eq!(blue.position, Vec3::new(0.0, 0.0, -7.0));
        assert!((blue.forward - Vec3::Z).length() < 1e-5);
        assert_eq!(duel.round(), 1);
        assert!(!duel.is_finished());
    }

    #[test]
    fn test_invalid_scenario_is_rejected() {
        let mut scenario = quick_scenario();
        scenario.spawns.truncate(1);
        assert!(DuelMatch::new(scenario, 1).is_err());
    }

    #[test]
    fn test_jitter_keeps_spawns_clear() {
        let scenario = Scenario::training();
        for seed in 0..20 {
            let duel = DuelMatch::new(scenario.clone(), seed).unwrap();
            for c in duel.contestants() {
                let p = c.agent.pose().position;
                assert!(scenario.arena.is_clear(p, scenario.body.radius), "seed {seed}: {p}");
            }
        }
    }

    #[test]
    fn test_first_step_fires_and_launches() {
        let mut scenario = quick_scenario();
        scenario.spawns[0].position = Vec3::new(0.0, 0.0, -4.0);
        scenario.spawns[1].position = Vec3::new(0.0, 0.0, 4.0);
        let mut duel = DuelMatch::new(scenario, 3).unwrap();
        let summary = duel.step(&[]);
        assert_eq!(summary.shots, vec![0, 1]);
        assert_eq!(duel.projectiles().len(), 2);
        assert_eq!(duel.metrics().contestants["blue"].shots_fired, 1);
    }

    #[test]
    fn test_step_after_finish_is_noop() {
        let mut duel = DuelMatch::new(quick_scenario(), 1).unwrap();
        let outcome = duel.run_to_end(10);
        assert_eq!(outcome.condition, EndCondition::TickLimit);
        let hash = duel.state_hash();
        let summary = duel.step(&[]);
        assert_eq!(summary, StepSummary::default());
        assert_eq!(duel.state_hash(), hash);
        assert_eq!(duel.tick(), 10);
    }

    #[test]
    fn test_round_limit_ends_match() {
        let mut scenario = quick_scenario();
        scenario.rules.round_time = 0.2;
        scenario.rules.max_rounds = 3;
        scenario.duel.agent.combat.weapon = None;
        let mut duel = DuelMatch::new(scenario, 1).unwrap();

        let mut rounds_ended = 0;
        while !duel.is_finished() {
            if duel.step(&[]).round_ended {
                rounds_ended += 1;
            }
        }
        assert_eq!(rounds_ended, 3);
        let outcome = duel.outcome().unwrap();
        assert_eq!(outcome.condition, EndCondition::RoundLimit);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.tick, 30);

        let metrics = duel.into_metrics();
        assert_eq!(metrics.rounds.len(), 3);
        assert_eq!(metrics.rounds_played, 3);
        assert_eq!(metrics.end_condition, "round_limit");
    }

    #[test]
    fn test_round_boundary_resets_episode() {
        let mut scenario = quick_scenario();
        scenario.rules.round_time = 0.2;
        scenario.duel.agent.combat.weapon = None;
        let mut duel = DuelMatch::new(scenario, 1).unwrap();
        for _ in 0..9 {
            duel.step(&[]);
        }
        assert_ne!(duel.contestants()[0].agent.episode().ticks, 0);
        let summary = duel.step(&[]);
        assert!(summary.round_ended);
        assert_eq!(duel.round(), 2);
        for c in duel.contestants() {
            assert_eq!(c.agent.episode().total, 0.0);
            assert_eq!(c.agent.pose(), c.agent.spawn_pose());
        }
    }

    #[test]
    fn test_policy_action_drives_first_contestant() {
        let mut duel = DuelMatch::new(quick_scenario(), 1).unwrap();
        let strafe = PolicyAction {
            move_x: 1.0,
            ..PolicyAction::default()
        };
        for _ in 0..25 {
            duel.step(&[Some(strafe)]);
        }
        assert!(duel.contestants()[0].agent.pose().position.x > 1.0);
    }

    #[test]
    fn test_leader_tie_is_draw() {
        let mut duel = DuelMatch::new(quick_scenario(), 1).unwrap();
        assert_eq!(duel.leader(), None);
        duel.contestants[1].score = 2;
        assert_eq!(duel.leader(), Some(1));
        duel.contestants[0].score = 2;
        assert_eq!(duel.leader(), None);
    }
}
