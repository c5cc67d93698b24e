//! Headless duel runner.
//!
//! This binary hosts a two-agent duel without graphics. It is controlled via
//! JSON on stdin/stdout or runs scripted matches for evaluation.
//!
//! # Usage
//!
//! ```bash
//! # Serve the step protocol on stdin/stdout
//! cargo run -p duel_headless
//!
//! # Play one scripted match and print its metrics
//! cargo run -p duel_headless -- run --scenario corridor --seed 3
//!
//! # Evaluate many seeds in parallel
//! cargo run -p duel_headless -- batch --scenario training --count 500 --output results/
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    duel::DuelMatch,
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "duel_headless")]
#[command(about = "Headless duel arena for agent training and evaluation")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON-lines step protocol on stdin/stdout
    Serve {
        /// Scenario preset or RON file
        #[arg(short, long, default_value = "training")]
        scenario: String,

        /// Seed for the first match
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Play one scripted match
    Run {
        /// Scenario preset or RON file
        #[arg(short, long, default_value = "training")]
        scenario: String,

        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick budget for the match
        #[arg(long, default_value = "30000")]
        max_ticks: u64,

        /// Write the match metrics as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of scripted matches
    Batch {
        /// Scenario preset or RON file
        #[arg(short, long, default_value = "training")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick budget per match
        #[arg(long, default_value = "30000")]
        max_ticks: u64,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "training")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick budget per run
        #[arg(long, default_value = "3000")]
        max_ticks: u64,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "30000")]
        ticks: u64,

        /// Scenario to benchmark
        #[arg(short, long, default_value = "training")]
        scenario: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Serve { scenario, seed }) => cmd_serve(&scenario, seed),
        Some(Commands::Run {
            scenario,
            seed,
            max_ticks,
            output,
        }) => cmd_run(&scenario, seed, max_ticks, output),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
        }) => cmd_batch(scenario, count, parallel, output, seed, max_ticks),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            max_ticks,
        }) => cmd_verify(&scenario, seed, runs, max_ticks),
        Some(Commands::Benchmark { ticks, scenario }) => cmd_benchmark(ticks, &scenario),
        None => cmd_serve("training", 0),
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario '{}': {}", name, e);
            process::exit(1);
        }
    }
}

/// Serve the step protocol
fn cmd_serve(scenario: &str, seed: u64) {
    tracing::info!("Starting protocol session");

    let config = HeadlessConfig {
        scenario: load_scenario(scenario),
        seed,
    };
    let mut runner = match HeadlessRunner::with_config(config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start match: {}", e);
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        tracing::error!(error = %e, "Protocol session failed");
        process::exit(1);
    }
}

/// Play one scripted match
fn cmd_run(scenario: &str, seed: u64, max_ticks: u64, output: Option<PathBuf>) {
    let scenario = load_scenario(scenario);
    let mut duel = match DuelMatch::new(scenario, seed) {
        Ok(duel) => duel,
        Err(e) => {
            eprintln!("Failed to start match: {}", e);
            process::exit(1);
        }
    };

    let start = Instant::now();
    duel.run_to_end(max_ticks);
    let elapsed = start.elapsed();
    let metrics = duel.into_metrics();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("MATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Scenario: {} (seed {})", metrics.scenario, metrics.seed);
    eprintln!(
        "Winner: {}",
        metrics.winner.as_deref().unwrap_or("draw")
    );
    eprintln!("Ended by: {}", metrics.end_condition);
    eprintln!(
        "Ticks: {} over {} round(s) in {:.3}s",
        metrics.duration_ticks,
        metrics.rounds_played,
        elapsed.as_secs_f64()
    );
    let mut names: Vec<&String> = metrics.contestants.keys().collect();
    names.sort();
    for name in names {
        let c = &metrics.contestants[name];
        eprintln!(
            "  {:<8} hits {:>2}/{:<3} taken {:>2}  dodges {:>3}  return {:>8.3}  stuck {:>5.1}s",
            name, c.hits_landed, c.shots_fired, c.hits_taken, c.dodges, c.total_return, c.stuck_seconds
        );
    }
    eprintln!("State hash: {:016x}", metrics.final_state_hash);

    if let Some(path) = output {
        let written = serde_json::to_string_pretty(&metrics)
            .map_err(io::Error::other)
            .and_then(|json| std::fs::write(&path, json));
        if let Err(e) = written {
            eprintln!("FATAL: Failed to save metrics: {}", e);
            process::exit(1);
        }
        eprintln!("Metrics saved to: {}", path.display());
    }
}

/// Run batch of matches
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_ticks: u64,
) {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        max_ticks = max_ticks,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        process::exit(1);
    }

    let config = BatchConfig {
        scenario,
        match_count: count,
        parallel_matches: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_ticks,
    };

    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {}", e);
        process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.matches.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} matches/sec",
        results.matches.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "Match length: avg {:.0} ticks (min {}, max {})",
        summary.avg_duration_ticks, summary.min_duration_ticks, summary.max_duration_ticks
    );
    eprintln!("Draws: {}", summary.draws);

    let mut names: Vec<&String> = summary.avg_return.keys().collect();
    names.sort();
    eprintln!("\nPer contestant:");
    for name in names {
        eprintln!(
            "  {:<8} win {:>5.1}%  return {:>8.3}  hits {:>5.2}  dodges {:>5.2}  stuck {:>5.1}s",
            name,
            summary.win_rates.get(name).copied().unwrap_or(0.0) * 100.0,
            summary.avg_return.get(name).copied().unwrap_or(0.0),
            summary.avg_hits.get(name).copied().unwrap_or(0.0),
            summary.avg_dodges.get(name).copied().unwrap_or(0.0),
            summary.avg_stuck_seconds.get(name).copied().unwrap_or(0.0),
        );
    }
    if let Some(name) = summary.dominant_contestant(0.1) {
        eprintln!("\n{} dominates this scenario", name);
    }

    if !results.errors.is_empty() {
        eprintln!("\nMATCH FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Match {} (seed {}): {}",
                error.match_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32, max_ticks: u64) {
    tracing::info!(
        "Verifying determinism: {} runs of seed {} on '{}'",
        runs,
        seed,
        scenario
    );

    match verify_determinism(scenario, seed, runs, max_ticks) {
        Ok(true) => {
            eprintln!("PASS: All {} runs produced identical results", runs);
        }
        Ok(false) => {
            eprintln!("FAIL: Runs produced different results!");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: Error during verification: {}", e);
            process::exit(1);
        }
    }
}

/// Run benchmark
fn cmd_benchmark(ticks: u64, scenario: &str) {
    tracing::info!("Running {} tick benchmark", ticks);

    let scenario = load_scenario(scenario);
    let new_match = |seed: u64| match DuelMatch::new(scenario.clone(), seed) {
        Ok(duel) => duel,
        Err(e) => {
            eprintln!("Failed to start match: {}", e);
            process::exit(1);
        }
    };

    let mut seed = 0;
    let mut duel = new_match(seed);
    let mut matches = 1u32;

    eprintln!("Running {} ticks...", ticks);

    // Warmup
    for _ in 0..100 {
        duel.step(&[]);
    }

    let start = Instant::now();
    for _ in 0..ticks {
        if duel.is_finished() {
            seed += 1;
            matches += 1;
            duel = new_match(seed);
        }
        duel.step(&[]);
    }
    let elapsed = start.elapsed();

    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {}", ticks);
    eprintln!("Matches: {}", matches);
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {:.1}", tps);
    eprintln!("ms/tick: {:.4}", elapsed.as_secs_f64() * 1000.0 / ticks.max(1) as f64);
    eprintln!("State hash: {:016x}", duel.state_hash());
}
