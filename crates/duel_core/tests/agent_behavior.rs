//! Scenario-level behaviour of a single agent against a static opponent.

use duel_core::agent::{Environment, PolicyAction, TickReport};
use duel_core::config::AgentConfig;
use duel_core::math::planar_distance;
use duel_core::state_machine::CombatState;
use duel_test_utils::determinism::{strategies, DeterministicSim};
use duel_test_utils::fixtures::AgentFixture;
use duel_test_utils::proptest::prelude::*;
use glam::Vec3;

fn tick(fixture: &mut AgentFixture) -> TickReport {
    let policy = if fixture.policy.is_empty() {
        None
    } else {
        let i = (fixture.agent.tick_count() % fixture.policy.len() as u64) as usize;
        Some(fixture.policy[i])
    };
    let env = Environment::new(&fixture.world, &fixture.roster);
    let report = fixture
        .agent
        .tick(fixture.dt, &env, &mut fixture.body, policy.as_ref());
    fixture.sync();
    report
}

fn opponent_distance(fixture: &AgentFixture, opponent: Vec3) -> f32 {
    planar_distance(fixture.agent.pose().position, opponent)
}

#[test]
fn test_far_opponent_is_chased() {
    let mut fixture = AgentFixture::facing_off(14.0);
    let first = tick(&mut fixture);
    assert_eq!(first.state, CombatState::Chasing);
    assert!(first.shot.is_none(), "out of fire range");

    fixture.run(49);
    assert!(opponent_distance(&fixture, Vec3::new(0.0, 0.0, 14.0)) < 12.0);
}

#[test]
fn test_close_opponent_triggers_retreat_and_dash() {
    let mut unarmed = AgentConfig::default();
    unarmed.combat.weapon = None;
    let mut fixture = AgentFixture::facing_off(3.0).with_agent_config(unarmed);
    let first = tick(&mut fixture);
    assert_eq!(first.state, CombatState::Repositioning);
    assert!(first.dashed);
    assert!(fixture.agent.timers().is_dashing());

    fixture.run(25);
    assert!(opponent_distance(&fixture, Vec3::new(0.0, 0.0, 3.0)) > 3.0);
}

#[test]
fn test_shot_is_followed_by_advance() {
    let mut fixture = AgentFixture::facing_off(8.0);
    let first = tick(&mut fixture);
    assert!(first.shot.is_some());
    let second = tick(&mut fixture);
    assert_eq!(second.state, CombatState::PostShotAdvance);

    fixture.run(40);
    assert!(opponent_distance(&fixture, Vec3::new(0.0, 0.0, 8.0)) < 8.0);
}

#[test]
fn test_fire_rate_is_bounded_by_reload() {
    let mut fixture = AgentFixture::facing_off(7.0);
    let mut shot_ticks = Vec::new();
    for _ in 0..500 {
        let report = tick(&mut fixture);
        if report.shot.is_some() {
            shot_ticks.push(report.tick);
        }
    }

    assert!((2..=4).contains(&shot_ticks.len()), "shots at {shot_ticks:?}");
    assert_eq!(shot_ticks[0], 1);
    for pair in shot_ticks.windows(2) {
        assert!(pair[1] - pair[0] >= 149, "shots at {shot_ticks:?}");
    }
    assert_eq!(fixture.agent.sink().shots().count(), shot_ticks.len());
}

#[test]
fn test_reward_is_timestep_independent() {
    let hold = vec![PolicyAction::default()];
    let mut coarse = AgentFixture::facing_off(7.0).with_policy(hold.clone());
    let mut fine = AgentFixture::facing_off(7.0)
        .with_policy(hold)
        .with_dt(0.01);

    coarse.run(50);
    fine.run(100);

    let a = coarse.agent.episode().total;
    let b = fine.agent.episode().total;
    assert!(a > 1.9 && a < 2.0, "one second of ideal engagement: {a}");
    assert!((a - b).abs() < 1e-3, "{a} vs {b}");
}

#[test]
fn test_holding_fire_becomes_passive() {
    let mut fixture = AgentFixture::facing_off(7.0).with_policy(vec![PolicyAction::default()]);
    fixture.run(200);
    assert_eq!(fixture.agent.last_reward().passivity, 0.0);
    fixture.run(160);
    assert!(fixture.agent.last_reward().passivity < 0.0);
}

#[test]
fn test_lonely_agent_searches_without_reward() {
    let mut fixture = AgentFixture::alone();
    for _ in 0..100 {
        let report = tick(&mut fixture);
        assert_eq!(report.state, CombatState::Searching);
        assert!(report.shot.is_none());
    }
    assert_eq!(fixture.agent.episode().total, 0.0);
    assert!(fixture.agent.opponent().is_none());
}

#[test]
fn test_wall_between_agents_blocks_fire() {
    let mut fixture = AgentFixture::behind_wall();
    let first = tick(&mut fixture);
    assert_eq!(first.state, CombatState::Bypassing);
    assert!(first.shot.is_none());
    assert!(!fixture.agent.sensing().target_visible);
    assert!(first.reward.visibility == 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_policy_driven_agent_keeps_invariants(
        policy in strategies::arb_policy_sequence(12),
        dt in strategies::arb_dt(),
        distance in strategies::arb_distance(),
    ) {
        let mut fixture = AgentFixture::facing_off(distance).with_dt(dt).with_policy(policy);
        for _ in 0..150 {
            fixture.step();
            let agent = &fixture.agent;
            let timers = agent.timers();
            prop_assert!(timers.reload_remaining >= 0.0);
            prop_assert!(timers.dash_remaining >= 0.0);
            prop_assert!(timers.dash_cooldown_remaining >= 0.0);
            prop_assert!(timers.can_fire() == (timers.reload_remaining <= 0.0));
            prop_assert!(agent.pose().position.is_finite());
            prop_assert!((agent.pose().forward.length() - 1.0).abs() < 1e-3);
            prop_assert!(agent.horizontal_speed() >= 0.0);
            prop_assert!(agent.episode().total.is_finite());
            let counters = agent.counters();
            prop_assert!(counters.time_since_target_visible >= 0.0);
            prop_assert!(counters.wall_proximity_time >= 0.0);
        }
    }
}
