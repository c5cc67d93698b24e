//! Headless duel runner implementation.
//!
//! Reads [`Command`]s one JSON line at a time, applies them to a
//! [`DuelMatch`] and answers each with exactly one [`Response`] line.

use std::io::{self, BufRead, Write};

use crate::duel::DuelMatch;
use crate::protocol::{AgentView, Command, OutcomeView, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Scenario every match is built from.
    pub scenario: Scenario,
    /// Seed for the first match and for `reset` without a seed.
    pub seed: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::training(),
            seed: 0,
        }
    }
}

/// Events gathered between two state lines.
#[derive(Debug, Clone, Copy, Default)]
struct Pending {
    hits: u32,
    dodges: u32,
}

/// Headless runner for trainer-controlled matches.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    duel: DuelMatch,
    pending: Vec<Pending>,
}

impl HeadlessRunner {
    /// Create a runner on the default training scenario.
    pub fn new() -> Result<Self, ScenarioError> {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Result<Self, ScenarioError> {
        let duel = DuelMatch::new(config.scenario.clone(), config.seed)?;
        let pending = vec![Pending::default(); duel.contestants().len()];
        Ok(Self {
            config,
            duel,
            pending,
        })
    }

    /// The match being driven.
    #[must_use]
    pub fn duel(&self) -> &DuelMatch {
        &self.duel
    }

    /// Apply one command.
    pub fn handle(&mut self, cmd: Command) -> Response {
        let cmd_name = cmd.name();
        match cmd {
            Command::Reset { seed } => {
                let seed = seed.unwrap_or(self.config.seed);
                match DuelMatch::new(self.config.scenario.clone(), seed) {
                    Ok(duel) => {
                        tracing::info!(seed, "Match reset");
                        self.duel = duel;
                        self.pending = vec![Pending::default(); self.duel.contestants().len()];
                        self.state()
                    }
                    Err(e) => Response::error(e.to_string(), Some(cmd_name)),
                }
            }

            Command::Step { count, actions } => {
                let agents = self.duel.contestants().len();
                if actions.len() > agents {
                    return Response::error(
                        format!("got {} actions for {} agents", actions.len(), agents),
                        Some(cmd_name),
                    );
                }
                for _ in 0..count {
                    if self.duel.is_finished() {
                        break;
                    }
                    let summary = self.duel.step(&actions);
                    for hit in &summary.hits {
                        if let Some(p) = self.pending.get_mut(hit.shooter) {
                            p.hits += 1;
                        }
                    }
                    for &index in &summary.dodges {
                        if let Some(p) = self.pending.get_mut(index) {
                            p.dodges += 1;
                        }
                    }
                }
                self.state()
            }

            Command::Query => self.state(),

            Command::Hash => Response::StateHash {
                tick: self.duel.tick(),
                hash: self.duel.state_hash(),
            },

            Command::Quit => Response::Bye,
        }
    }

    /// Build a state line. Clears the per-line reward and event counts.
    fn state(&mut self) -> Response {
        let observations: Vec<Vec<f32>> = (0..self.duel.contestants().len())
            .map(|i| self.duel.observe(i).map(|o| o.to_vec()).unwrap_or_default())
            .collect();

        let mut agents = Vec::with_capacity(observations.len());
        for (index, observation) in observations.into_iter().enumerate() {
            let pending = self
                .pending
                .get_mut(index)
                .map(std::mem::take)
                .unwrap_or_default();
            let Some(c) = self.duel.contestant_mut(index) else {
                continue;
            };
            let pose = c.agent.pose();
            agents.push(AgentView {
                name: c.name.clone(),
                id: c.id().0,
                team: c.team,
                state: c.agent.combat_state().as_str().to_string(),
                alive: c.agent.is_alive(),
                score: c.score,
                position: pose.position.to_array(),
                forward: pose.forward.to_array(),
                observation,
                reward: c.agent.take_step_reward(),
                episode_return: c.agent.episode().total,
                hits: pending.hits,
                dodges: pending.dodges,
            });
        }

        let outcome = self.duel.outcome().map(|o| OutcomeView {
            winner: o
                .winner
                .and_then(|i| self.duel.contestants().get(i))
                .map(|c| c.name.clone()),
            condition: o.condition.as_str().to_string(),
            tick: o.tick,
        });

        Response::State {
            tick: self.duel.tick(),
            round: self.duel.round(),
            round_time_left: self.duel.round_time_left(),
            agents,
            projectiles: self.duel.projectiles().len(),
            outcome,
            hash: self.duel.state_hash(),
        }
    }

    /// Serve the protocol until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        let names = self
            .duel
            .contestants()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        output.write_all(Response::ready(self.duel.tick(), names).to_json_line().as_bytes())?;
        output.flush()?;
        tracing::info!(scenario = %self.config.scenario.name, seed = self.duel.seed(), "Runner ready");

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match Command::from_json(line) {
                Ok(cmd) => {
                    tracing::debug!(cmd = cmd.name(), "Command");
                    self.handle(cmd)
                }
                Err(e) => Response::error(format!("Parse error: {}", e), None),
            };
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;

            if matches!(response, Response::Bye) {
                tracing::info!("Runner shutting down");
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::agent::PolicyAction;
    use std::io::Cursor;

    fn runner() -> HeadlessRunner {
        let mut scenario = Scenario::open_field();
        scenario.rules.spawn_jitter = 0.0;
        HeadlessRunner::with_config(HeadlessConfig { scenario, seed: 5 }).unwrap()
    }

    #[test]
    fn test_step_advances_and_reports_agents() {
        let mut runner = runner();
        let response = runner.handle(Command::Step {
            count: 10,
            actions: vec![],
        });
        let Response::State { tick, round, agents, .. } = response else {
            panic!("expected state, got {response:?}");
        };
        assert_eq!(tick, 10);
        assert_eq!(round, 1);
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].name, "blue");
        assert_eq!(agents[1].name, "red");
        assert_eq!(agents[0].observation.len(), 26);
    }

    #[test]
    fn test_query_does_not_advance() {
        let mut runner = runner();
        runner.handle(Command::Step {
            count: 3,
            actions: vec![],
        });
        let Response::State { tick, hash, .. } = runner.handle(Command::Query) else {
            panic!("expected state");
        };
        assert_eq!(tick, 3);
        let Response::StateHash { tick: t, hash: h } = runner.handle(Command::Hash) else {
            panic!("expected hash");
        };
        assert_eq!((t, h), (3, hash));
    }

    #[test]
    fn test_reward_is_cleared_per_state_line() {
        let mut runner = runner();
        runner.handle(Command::Step {
            count: 20,
            actions: vec![],
        });
        let Response::State { agents, .. } = runner.handle(Command::Query) else {
            panic!("expected state");
        };
        for agent in &agents {
            assert_eq!(agent.reward, 0.0, "{} kept a stale reward", agent.name);
        }
    }

    #[test]
    fn test_reward_survives_round_boundary() {
        let mut scenario = Scenario::open_field();
        scenario.rules.spawn_jitter = 0.0;
        scenario.rules.round_time = 0.2;
        let mut runner = HeadlessRunner::with_config(HeadlessConfig { scenario, seed: 5 }).unwrap();

        let response = runner.handle(Command::Step {
            count: 10,
            actions: vec![],
        });
        let Response::State { round, agents, .. } = response else {
            panic!("expected state, got {response:?}");
        };
        assert_eq!(round, 2);
        for agent in &agents {
            assert_eq!(agent.episode_return, 0.0);
        }
        assert!(
            agents.iter().any(|a| a.reward != 0.0),
            "reward of the finished round was dropped"
        );
    }

    #[test]
    fn test_too_many_actions_is_an_error() {
        let mut runner = runner();
        let response = runner.handle(Command::Step {
            count: 1,
            actions: vec![None, None, Some(PolicyAction::default())],
        });
        assert!(matches!(response, Response::Error { cmd: Some(ref c), .. } if c == "step"));
        assert_eq!(runner.duel().tick(), 0);
    }

    #[test]
    fn test_reset_restores_initial_hash() {
        let mut runner = runner();
        let initial = runner.duel().state_hash();
        runner.handle(Command::Step {
            count: 30,
            actions: vec![],
        });
        assert_ne!(runner.duel().state_hash(), initial);
        runner.handle(Command::Reset { seed: None });
        assert_eq!(runner.duel().tick(), 0);
        assert_eq!(runner.duel().state_hash(), initial);
    }

    #[test]
    fn test_session_over_io() {
        let input = concat!(
            "{\"cmd\":\"step\",\"count\":2}\n",
            "\n",
            "not json\n",
            "{\"cmd\":\"hash\"}\n",
            "{\"cmd\":\"quit\"}\n",
            "{\"cmd\":\"query\"}\n",
        );
        let mut output = Vec::new();
        runner().run(Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains(r#""type":"ready""#));
        assert!(lines[1].contains(r#""type":"state""#));
        assert!(lines[2].contains(r#""type":"error""#));
        assert!(lines[3].contains(r#""type":"state_hash""#));
        assert_eq!(lines[4], r#"{"type":"bye"}"#);
    }
}
