//! JSON protocol for driving a duel from an external trainer.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the trainer
//! **Output (stdout):** Match state and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Trainer sends commands as JSON lines
//! 3. Runner answers every command with exactly one line
//! 4. `quit` is answered with `{"type":"bye"}` and the runner exits
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"agents":["blue","red"]}
//! -> {"cmd":"step","count":5,"actions":[{"move_x":1.0,"shoot":true},null]}
//! <- {"type":"state","tick":5,"round":1,"agents":[...],"hash":...}
//! -> {"cmd":"reset","seed":9}
//! <- {"type":"state","tick":0,...}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":0,"hash":1234}
//! ```
//!
//! A `null` action (or a missing entry) leaves that agent on its scripted
//! controller for the step.

use duel_core::agent::PolicyAction;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Trainer -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Start a fresh match, optionally with a new seed.
    Reset {
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Advance the match by N ticks (default: 1) applying the same actions
    /// every tick.
    Step {
        #[serde(default = "default_step_count")]
        count: u32,
        #[serde(default)]
        actions: Vec<Option<PolicyAction>>,
    },

    /// Query current state without advancing time.
    Query,

    /// Report the state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_step_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Trainer)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        tick: u64,
        agents: Vec<String>,
    },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current match state.
    State {
        tick: u64,
        round: u32,
        round_time_left: f32,
        agents: Vec<AgentView>,
        projectiles: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<OutcomeView>,
        hash: u64,
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// One agent as seen by the trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub name: String,
    pub id: u32,
    pub team: u8,
    /// Combat state label (`chasing`, `sidestepping`, ...).
    pub state: String,
    pub alive: bool,
    pub score: u32,
    pub position: [f32; 3],
    pub forward: [f32; 3],
    /// Flattened observation vector.
    pub observation: Vec<f32>,
    /// Reward gathered since the previous state line.
    pub reward: f32,
    /// Return of the current episode (round).
    pub episode_return: f32,
    /// Hits landed since the previous state line.
    pub hits: u32,
    /// Near misses since the previous state line.
    pub dodges: u32,
}

/// Final result of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub condition: String,
    pub tick: u64,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64, agents: Vec<String>) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
            agents,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "reset",
            Self::Step { .. } => "step",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::agent::Rotate;

    #[test]
    fn test_parse_step_command() {
        let json = r#"{"cmd":"step","count":60}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Step { count: 60, ref actions } if actions.is_empty()));
    }

    #[test]
    fn test_default_step_count() {
        let cmd = Command::from_json(r#"{"cmd":"step"}"#).unwrap();
        assert!(matches!(cmd, Command::Step { count: 1, .. }));
    }

    #[test]
    fn test_parse_actions_with_gaps() {
        let json = r#"{"cmd":"step","actions":[{"move_z":1.0,"rotate":"left","shoot":true},null]}"#;
        let Command::Step { actions, .. } = Command::from_json(json).unwrap() else {
            panic!("expected step");
        };
        assert_eq!(actions.len(), 2);
        let first = actions[0].unwrap();
        assert_eq!(first.move_z, 1.0);
        assert_eq!(first.move_x, 0.0);
        assert_eq!(first.rotate, Rotate::Left);
        assert!(first.shoot);
        assert!(!first.dash);
        assert!(actions[1].is_none());
    }

    #[test]
    fn test_parse_reset() {
        let cmd = Command::from_json(r#"{"cmd":"reset","seed":9}"#).unwrap();
        assert!(matches!(cmd, Command::Reset { seed: Some(9) }));
        let cmd = Command::from_json(r#"{"cmd":"reset"}"#).unwrap();
        assert!(matches!(cmd, Command::Reset { seed: None }));
        assert_eq!(cmd.name(), "reset");
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Command::from_json(r#"{"cmd":"spawn"}"#).is_err());
    }

    #[test]
    fn test_serialize_state_response() {
        let resp = Response::State {
            tick: 100,
            round: 2,
            round_time_left: 12.5,
            agents: vec![],
            projectiles: 1,
            outcome: None,
            hash: 12345,
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""tick":100"#));
        assert!(!json.contains("outcome"));
    }

    #[test]
    fn test_serialize_bye() {
        assert_eq!(Response::Bye.to_json_line(), "{\"type\":\"bye\"}\n");
    }
}
