//! # Duel Core
//!
//! Decision core of a two-actor duel agent.
//!
//! This crate contains **only** agent logic:
//! - No rendering
//! - No physics world (geometry arrives through [`geometry::GeometryQuery`])
//! - No system randomness (each agent owns a seeded `ChaCha8Rng`)
//! - No IO beyond loading a RON config
//!
//! Given the same config, seed, geometry and tick sequence, an agent makes
//! the same decisions bit for bit.
//!
//! ## Crate Structure
//!
//! - [`sensing`] - Ray fans, line of sight, wall proximity
//! - [`stuck`] - Low-displacement detection
//! - [`avoidance`] - Candidate-heading obstacle avoidance
//! - [`state_machine`] - Scripted combat movement states
//! - [`timers`] - Reload and dash timers
//! - [`reward`] - Dense reward shaping for training
//! - [`agent`] - The per-tick pipeline tying them together
//! - [`shapes`] - Box and cylinder colliders for hosts without a physics engine

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod avoidance;
pub mod body;
pub mod config;
pub mod counters;
pub mod error;
pub mod events;
pub mod geometry;
pub mod locomotion;
pub mod math;
pub mod observation;
pub mod registry;
pub mod reward;
pub mod sensing;
pub mod shapes;
pub mod smoothing;
pub mod state_machine;
pub mod stuck;
pub mod timers;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, Environment, PolicyAction, Rotate, TickReport};
    pub use crate::body::{FreeBody, MotionBody, Pose};
    pub use crate::config::{AgentConfig, DuelConfig, RewardConfig};
    pub use crate::error::{DuelError, Result};
    pub use crate::events::{CombatEvent, CombatEventSink, EventLog, FireCommand, NullSink};
    pub use crate::geometry::{AgentId, GeometryQuery, Layer, LayerMask, RayHit, RayQuery};
    pub use crate::observation::{Observation, OBSERVATION_LEN};
    pub use crate::registry::{OpponentSnapshot, RoleRegistry, Roster};
    pub use crate::reward::{RewardBreakdown, RewardShaper, TerminalEvent};
    pub use crate::shapes::{Aabb, ColliderSet, Cylinder};
    pub use crate::state_machine::CombatState;
}
