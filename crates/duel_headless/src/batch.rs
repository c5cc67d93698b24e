//! Batch match runner for agent evaluation.
//!
//! Runs many seeded matches in parallel using rayon and aggregates the
//! per-match metrics into a [`BatchSummary`].

use crate::duel::DuelMatch;
use crate::metrics::{BatchSummary, MatchMetrics};
use crate::scenario::{Scenario, ScenarioError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario preset name or RON file path
    pub scenario: String,
    /// Number of matches to run
    pub match_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_matches: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Maximum ticks per match
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "training".to_string(),
            match_count: 100,
            parallel_matches: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: 30_000, // 10 rounds of 60 s at 50 tps
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, match_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            match_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-match tick budget
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match metrics
    pub matches: Vec<MatchMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub match_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    /// Completed matches
    pub completed: Arc<AtomicU32>,
    /// Start time
    pub start_time: Instant,
    partial_wins: Arc<Mutex<HashMap<String, u32>>>,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: Arc::new(AtomicU32::new(0)),
            start_time: Instant::now(),
            partial_wins: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a completed match
    pub fn record_completion(&self, winner: Option<&str>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(w) = winner {
            if let Ok(mut wins) = self.partial_wins.lock() {
                *wins.entry(w.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_match = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_match * f64::from(remaining))
    }

    /// Get current win rates
    pub fn current_win_rates(&self) -> HashMap<String, f64> {
        let completed = self.current();
        if completed == 0 {
            return HashMap::new();
        }

        match self.partial_wins.lock() {
            Ok(wins) => wins
                .iter()
                .map(|(k, v)| (k.clone(), f64::from(*v) / f64::from(completed)))
                .collect(),
            Err(_) => HashMap::new(),
        }
    }

    /// Display progress to stderr
    pub fn display(&self) {
        let completed = self.current();
        let eta = self.eta();
        let rates = self.current_win_rates();

        eprintln!("╔════════════════════════════════════╗");
        eprintln!(
            "║ Batch Progress: {:>4}/{:<4} ({:>5.1}%) ║",
            completed,
            self.total,
            self.percentage()
        );
        eprintln!(
            "║ ETA: {:>28} ║",
            format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60)
        );
        if !rates.is_empty() {
            eprintln!("╟────────────────────────────────────╢");
            eprintln!("║ Win Rates So Far:                  ║");
            let mut rates: Vec<_> = rates.into_iter().collect();
            rates.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, rate) in &rates {
                eprintln!("║   {:<12}: {:>5.1}%              ║", name, rate * 100.0);
            }
        }
        eprintln!("╚════════════════════════════════════╝");
    }
}

/// Run one scripted match to completion and collect its metrics.
pub fn run_single_match(
    scenario: &Scenario,
    seed: u64,
    max_ticks: u64,
) -> Result<MatchMetrics, String> {
    let mut duel = DuelMatch::new(scenario.clone(), seed).map_err(|e| e.to_string())?;
    duel.run_to_end(max_ticks);
    Ok(duel.into_metrics())
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = Arc::new(BatchProgress::new(config.match_count));

    info!(
        "Starting batch run: {} matches of '{}'",
        config.match_count, config.scenario
    );

    let scenario = match Scenario::resolve(&config.scenario) {
        Ok(scenario) => Some(scenario),
        Err(e) => {
            warn!("Failed to load scenario '{}': {}", config.scenario, e);
            None
        }
    };

    // Configure thread pool if specified
    if config.parallel_matches > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<MatchMetrics, BatchError>> = (0..config.match_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let outcome = match &scenario {
                Some(scenario) => run_single_match(scenario, seed, config.max_ticks),
                None => Err(format!("scenario '{}' unavailable", config.scenario)),
            };

            match outcome {
                Ok(metrics) => {
                    progress.record_completion(metrics.winner.as_deref());

                    let completed = progress.current();
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, config.match_count);
                    }
                    if completed % 100 == 0 {
                        progress.display();
                    }

                    Ok(metrics)
                }
                Err(e) => {
                    warn!("Match {} failed: {}", i, e);
                    Err(BatchError {
                        match_index: i,
                        seed,
                        message: e,
                    })
                }
            }
        })
        .collect();

    let (matches, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let matches: Vec<MatchMetrics> = matches.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        matches.len(),
        duration_seconds,
        matches.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed several times and comparing
/// outcome, duration and final state hash.
pub fn verify_determinism(
    scenario: &str,
    seed: u64,
    runs: u32,
    max_ticks: u64,
) -> Result<bool, ScenarioError> {
    let scenario = Scenario::resolve(scenario)?;
    let mut reference: Option<MatchMetrics> = None;

    for run in 0..runs.max(1) {
        let mut duel = DuelMatch::new(scenario.clone(), seed)?;
        duel.run_to_end(max_ticks);
        let metrics = duel.into_metrics();

        match &reference {
            None => reference = Some(metrics),
            Some(first) => {
                if metrics.final_state_hash != first.final_state_hash
                    || metrics.winner != first.winner
                    || metrics.duration_ticks != first.duration_ticks
                    || metrics.end_condition != first.end_condition
                {
                    warn!(
                        run,
                        expected = first.final_state_hash,
                        actual = metrics.final_state_hash,
                        "Determinism mismatch"
                    );
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
