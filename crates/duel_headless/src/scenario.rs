//! Scenario loading and configuration.
//!
//! A scenario fixes everything about a match except the seed: the arena, the
//! two spawn points, agent and reward tuning, projectile behaviour and the
//! round rules.

use std::path::Path;

use duel_core::config::DuelConfig;
use duel_core::error::DuelError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::ArenaLayout;
use crate::projectile::ProjectileConfig;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Agent or reward tuning rejected.
    #[error("Invalid duel config: {0}")]
    Config(#[from] DuelError),
    /// Scenario structure rejected.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// Where one contestant starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Contestant name used in metrics and protocol output.
    pub name: String,
    /// Feet position.
    pub position: Vec3,
    /// Facing in degrees, clockwise from +Z.
    pub yaw: f32,
}

impl SpawnPoint {
    /// Spawn point at `(x, z)` on the floor.
    #[must_use]
    pub fn new(name: impl Into<String>, x: f32, z: f32, yaw: f32) -> Self {
        Self {
            name: name.into(),
            position: Vec3::new(x, 0.0, z),
            yaw,
        }
    }
}

/// Round and scoring rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Seconds per round.
    pub round_time: f32,
    /// Rounds before the match ends on time.
    pub max_rounds: u32,
    /// Hits that win the match outright.
    pub score_target: u32,
    /// Maximum random offset of each spawn on X and Z.
    pub spawn_jitter: f32,
    /// Whether spawn facing is randomized.
    pub random_facing: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            round_time: 60.0,
            max_rounds: 10,
            score_target: 5,
            spawn_jitter: 2.0,
            random_facing: false,
        }
    }
}

/// Agent body dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDimensions {
    /// Cylinder radius.
    pub radius: f32,
    /// Cylinder height.
    pub height: f32,
}

impl Default for BodyDimensions {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.8,
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Arena geometry.
    pub arena: ArenaLayout,
    /// Exactly two spawn points, one per team.
    pub spawns: Vec<SpawnPoint>,
    /// Agent tuning, reward tuning and tick length.
    pub duel: DuelConfig,
    /// Projectile tuning.
    pub projectiles: ProjectileConfig,
    /// Round rules.
    pub rules: MatchRules,
    /// Agent body size.
    pub body: BodyDimensions,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::training()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Built-in scenario by name, otherwise a RON file at that path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match Self::preset(name) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name),
        }
    }

    /// Built-in scenario by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "training" => Some(Self::training()),
            "open_field" => Some(Self::open_field()),
            "corridor" => Some(Self::corridor()),
            _ => None,
        }
    }

    /// Two agents on opposite sides of the central block.
    #[must_use]
    pub fn training() -> Self {
        Self {
            name: "training".to_string(),
            description: "20x20 arena with a central block, spawns on either side".to_string(),
            arena: ArenaLayout::training(),
            spawns: vec![
                SpawnPoint::new("blue", 0.0, -7.0, 0.0),
                SpawnPoint::new("red", 0.0, 7.0, 180.0),
            ],
            duel: DuelConfig::default(),
            projectiles: ProjectileConfig::default(),
            rules: MatchRules::default(),
            body: BodyDimensions::default(),
        }
    }

    /// No obstacles: pure spacing and dodging.
    #[must_use]
    pub fn open_field() -> Self {
        Self {
            name: "open_field".to_string(),
            description: "Empty 20x20 arena".to_string(),
            arena: ArenaLayout::open(10.0),
            ..Self::training()
        }
    }

    /// Long narrow arena split by staggered blocks.
    #[must_use]
    pub fn corridor() -> Self {
        let block = |x: f32, z: f32| {
            duel_core::shapes::Aabb::from_center(Vec3::new(x, 1.5, z), Vec3::new(1.0, 1.5, 0.5))
        };
        Self {
            name: "corridor".to_string(),
            description: "Staggered cover between the spawns".to_string(),
            arena: ArenaLayout::open(10.0)
                .with_obstacle(block(-3.0, -3.0))
                .with_obstacle(block(3.0, 0.0))
                .with_obstacle(block(-3.0, 3.0)),
            spawns: vec![
                SpawnPoint::new("blue", 0.0, -8.0, 0.0),
                SpawnPoint::new("red", 0.0, 8.0, 180.0),
            ],
            ..Self::training()
        }
    }

    /// Check that the scenario can host a match.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.duel.validate()?;

        if self.spawns.len() != 2 {
            return Err(ScenarioError::Invalid(format!(
                "expected 2 spawn points, found {}",
                self.spawns.len()
            )));
        }
        if self.spawns[0].name == self.spawns[1].name {
            return Err(ScenarioError::Invalid(
                "spawn points must have distinct names".to_string(),
            ));
        }
        for spawn in &self.spawns {
            if !spawn.position.is_finite() || !self.arena.is_clear(spawn.position, self.body.radius)
            {
                return Err(ScenarioError::Invalid(format!(
                    "spawn '{}' is blocked or outside the arena",
                    spawn.name
                )));
            }
        }

        let positive = [
            ("arena.half_size", self.arena.half_size),
            ("rules.round_time", self.rules.round_time),
            ("projectiles.lifetime", self.projectiles.lifetime),
            ("body.radius", self.body.radius),
            ("body.height", self.body.height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScenarioError::Invalid(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        if !(self.rules.spawn_jitter.is_finite() && self.rules.spawn_jitter >= 0.0) {
            return Err(ScenarioError::Invalid(
                "rules.spawn_jitter must be non-negative".to_string(),
            ));
        }
        if self.rules.max_rounds == 0 || self.rules.score_target == 0 {
            return Err(ScenarioError::Invalid(
                "rules.max_rounds and rules.score_target must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticks in one round at the configured tick length.
    #[must_use]
    pub fn round_ticks(&self) -> u64 {
        let ticks = (self.rules.round_time / self.duel.tick_seconds).round();
        if ticks.is_finite() && ticks >= 1.0 {
            ticks as u64
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.name, "training");
        assert_eq!(scenario.spawns.len(), 2);
        scenario.validate().unwrap();
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["training", "open_field", "corridor"] {
            let scenario = Scenario::preset(name).unwrap();
            assert_eq!(scenario.name, name);
            scenario.validate().unwrap();
        }
        assert!(Scenario::preset("nope").is_none());
    }

    #[test]
    fn test_round_ticks() {
        let scenario = Scenario::training();
        assert_eq!(scenario.round_ticks(), 3000);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"(
            name: "tiny",
            arena: (half_size: 6.0),
            spawns: [
                (name: "a", position: (0.0, 0.0, -4.0), yaw: 0.0),
                (name: "b", position: (0.0, 0.0, 4.0), yaw: 180.0),
            ],
            rules: (round_time: 30.0, score_target: 3),
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "tiny");
        assert_eq!(scenario.rules.score_target, 3);
        assert_eq!(scenario.rules.max_rounds, 10);
        assert_eq!(scenario.arena.obstacles.len(), 1, "layout defaults to the training block");
        scenario.validate().unwrap();
    }

    #[test]
    fn test_rejects_one_spawn() {
        let mut scenario = Scenario::training();
        scenario.spawns.pop();
        assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_rejects_spawn_in_obstacle() {
        let mut scenario = Scenario::training();
        scenario.spawns[0].position = Vec3::ZERO;
        assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_agent_config() {
        let mut scenario = Scenario::training();
        scenario.duel.agent.movement.move_speed = -1.0;
        assert!(matches!(scenario.validate(), Err(ScenarioError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }
}
