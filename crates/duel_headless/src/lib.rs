//! Headless duel arena for training and CI verification.
//!
//! This crate hosts two duel agents without any engine. It supplies the
//! collaborators the core only sees through traits:
//!
//! - **Arena**: box walls and a floor answering ray and overlap queries
//! - **Bodies**: kinematic cylinders that slide along walls
//! - **Projectiles**: straight-line shots that hit, get blocked, expire or
//!   are dodged
//! - **Matches**: timed rounds, scoring and respawns
//!
//! On top of that it offers batch evaluation across seeds and a JSON-lines
//! step protocol so an external trainer can drive either agent.
//!
//! # Protocol
//!
//! - **stdin**: Commands from the controller (`reset`, `step`, `query`, ...)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Drive a match from a trainer
//! echo '{"cmd":"step","count":50}' | cargo run -p duel_headless
//!
//! # Evaluate 200 seeds of the training arena
//! cargo run -p duel_headless -- batch --scenario training --count 200
//!
//! # Verify determinism
//! cargo run -p duel_headless -- verify --seed 7
//! ```

pub mod arena;
pub mod batch;
pub mod duel;
pub mod kinematic;
pub mod metrics;
pub mod projectile;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use arena::ArenaLayout;
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use duel::{DuelMatch, MatchOutcome};
pub use kinematic::SlideBody;
pub use metrics::{BatchSummary, MatchMetrics, MetricsCollector};
pub use projectile::{Projectile, ProjectileOutcome};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
