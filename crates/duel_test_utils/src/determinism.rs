//! Determinism testing utilities.
//!
//! Provides a harness for verifying that agents and matches produce
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Training replays and evaluation seeds are only useful if a duel replays
//! bit for bit. Sources of non-determinism include:
//!
//! - **System randomness**: every agent owns a `ChaCha8Rng` seeded from its
//!   spawn position or an explicit seed. Nothing reads `thread_rng`.
//!
//! - **HashMap iteration order**: registries are `BTreeMap`s keyed by
//!   agent id.
//!
//! - **Variable timesteps**: every test drives the agent with a fixed `dt`.
//!
//! - **Cross-agent reads mid-tick**: agents read copied snapshots published
//!   before the tick, never each other's live state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual components (timers, stuck detector, ...)
//! 2. **Property tests**: random spawns and policies must still replay
//! 3. **Integration tests**: full matches are reproducible
//! 4. **Parallel tests**: running N matches on threads all match

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::panic;
use std::thread;

/// Something that advances in fixed ticks and can hash its state.
pub trait DeterministicSim {
    /// Advance one tick.
    fn step(&mut self);

    /// Hash of the complete mutable state.
    fn state_hash(&self) -> u64;
}

/// A [`DeterministicSim`] that can be saved and restored.
pub trait SnapshotSim: DeterministicSim {
    /// Save/restore failure.
    type Error: Debug;

    /// Encode the mutable state.
    fn save(&self) -> Result<Vec<u8>, Self::Error>;

    /// Replace the mutable state with a saved one.
    fn restore(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use duel_test_utils::determinism::verify_determinism;
/// use duel_test_utils::fixtures::AgentFixture;
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     100, // 100 ticks each
///     || AgentFixture::facing_off(7.0),
///     |f| f.run(1),
///     |f| f.agent.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`DeterministicSim`] twice and compare the final hashes.
pub fn verify_sim_determinism<S, F>(setup_fn: F, num_ticks: u64) -> bool
where
    S: DeterministicSim,
    F: Fn() -> S,
{
    verify_determinism(2, num_ticks, &setup_fn, S::step, S::state_hash).is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// variations or memory layout differences. Each simulation is built on
/// its own thread, so `S` need not be `Send`.
pub fn run_parallel_simulations_scoped<S, F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    S: DeterministicSim,
    F: Fn() -> S + Sync,
{
    let setup = &setup_fn;
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(move || {
                    let mut sim = setup();
                    for _ in 0..num_ticks {
                        sim.step();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<S, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    S: DeterministicSim,
    F: Fn() -> S,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.step();
        sim2.step();

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Runs diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a save/restore round trip preserves state exactly, and that
/// the restored copy keeps replaying in lockstep with the original.
pub fn verify_serialization_determinism<S, F>(setup_fn: F, num_ticks: u64) -> bool
where
    S: SnapshotSim,
    F: Fn() -> S,
{
    let mut sim = setup_fn();

    for _ in 0..num_ticks {
        sim.step();
    }

    let Ok(bytes) = sim.save() else {
        return false;
    };

    let mut restored = setup_fn();
    if restored.restore(&bytes).is_err() {
        return false;
    }
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..num_ticks.max(1) {
        sim.step();
        restored.step();
        if restored.state_hash() != sim.state_hash() {
            return false;
        }
    }
    true
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of agent determinism.
pub mod strategies {
    use duel_core::agent::{PolicyAction, Rotate};
    use glam::Vec3;
    use proptest::prelude::*;

    /// Floor position within `half` units of the origin on each axis.
    pub fn arb_position(half: f32) -> impl Strategy<Value = Vec3> {
        (-half..half, -half..half).prop_map(|(x, z)| Vec3::new(x, 0.0, z))
    }

    /// Horizontal unit facing.
    pub fn arb_facing() -> impl Strategy<Value = Vec3> {
        (0.0f32..360.0).prop_map(duel_core::math::from_yaw)
    }

    /// Fixed timestep between 200 Hz and 10 Hz.
    pub fn arb_dt() -> impl Strategy<Value = f32> {
        0.005f32..0.1
    }

    /// Opponent distance covering every range band.
    pub fn arb_distance() -> impl Strategy<Value = f32> {
        1.5f32..18.0
    }

    /// Personality seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Turn intent.
    pub fn arb_rotate() -> impl Strategy<Value = Rotate> {
        prop_oneof![Just(Rotate::None), Just(Rotate::Left), Just(Rotate::Right)]
    }

    /// One policy action.
    pub fn arb_policy_action() -> impl Strategy<Value = PolicyAction> {
        (
            -1.0f32..=1.0,
            -1.0f32..=1.0,
            arb_rotate(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(move_x, move_z, rotate, shoot, dash)| PolicyAction {
                move_x,
                move_z,
                rotate,
                shoot,
                dash,
            })
    }

    /// A non-empty sequence of policy actions.
    pub fn arb_policy_sequence(max_len: usize) -> impl Strategy<Value = Vec<PolicyAction>> {
        proptest::collection::vec(arb_policy_action(), 1..max_len.max(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::AgentFixture;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
        assert_eq!(result.unique_hashes(), vec![100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        use std::cell::Cell;
        let counter = Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_scripted_agent_determinism() {
        assert!(verify_sim_determinism(|| AgentFixture::facing_off(7.0), 300));
    }

    #[test]
    fn test_lonely_agent_determinism() {
        assert!(verify_sim_determinism(AgentFixture::alone, 300));
    }

    #[test]
    fn test_find_divergence_on_deterministic_agent() {
        let divergence = find_first_divergence(AgentFixture::behind_wall, 200);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = {
            let mut f = AgentFixture::facing_off(7.0).with_seed(1);
            f.run(100);
            f.state_hash()
        };
        let b = {
            let mut f = AgentFixture::facing_off(7.0).with_seed(2);
            f.run(100);
            f.state_hash()
        };
        assert_ne!(a, b);
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_agent() {
        assert!(verify_serialization_determinism(
            || AgentFixture::facing_off(7.0),
            0
        ));
    }

    #[test]
    fn test_serialization_preserves_engaged_agent() {
        assert!(verify_serialization_determinism(
            || AgentFixture::facing_off(12.0),
            250
        ));
    }

    // =========================================================================
    // Parallel tests
    // =========================================================================

    #[test]
    fn test_parallel_scripted_agents() {
        let result = run_parallel_simulations_scoped(|| AgentFixture::facing_off(5.0), 4, 300);
        assert_eq!(result.num_sims, 4);
        result.assert_deterministic();
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Any spawn layout replays exactly.
        #[test]
        fn prop_random_spawns_are_deterministic(
            subject in strategies::arb_position(15.0),
            opponent in strategies::arb_position(15.0),
        ) {
            prop_assume!(subject.distance(opponent) > 1.5);
            let result = verify_determinism(
                2,
                100,
                || AgentFixture::new(subject, opponent),
                AgentFixture::step,
                AgentFixture::state_hash,
            );
            prop_assert!(result.is_deterministic);
        }

        /// Policy-driven agents replay exactly.
        #[test]
        fn prop_policy_sequences_are_replayable(
            policy in strategies::arb_policy_sequence(16),
            dt in strategies::arb_dt(),
        ) {
            let setup = || AgentFixture::facing_off(7.0).with_dt(dt).with_policy(policy.clone());
            prop_assert!(verify_sim_determinism(setup, 120));
        }
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }
}
