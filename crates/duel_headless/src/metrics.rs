//! Match metrics collection for agent evaluation.
//!
//! Per-contestant counters for a single match, plus a summary across a batch
//! of matches for comparing agent tunings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Unique match identifier.
    pub match_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed used for spawn placement.
    pub seed: u64,
    /// Total match duration in ticks.
    pub duration_ticks: u64,
    /// Rounds started, including an unfinished last round.
    pub rounds_played: u32,
    /// Winning contestant (None = draw).
    pub winner: Option<String>,
    /// How the match ended.
    pub end_condition: String,
    /// Per-contestant metrics.
    pub contestants: HashMap<String, ContestantMetrics>,
    /// One record per round.
    pub rounds: Vec<RoundRecord>,
    /// Final match state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl MatchMetrics {
    /// Create a new match metrics instance.
    #[must_use]
    pub fn new(match_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            match_id: match_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create contestant metrics.
    pub fn contestant_mut(&mut self, name: &str) -> &mut ContestantMetrics {
        self.contestants
            .entry(name.to_string())
            .or_insert_with(|| ContestantMetrics::new(name))
    }

    /// Finalize the match with outcome.
    pub fn finalize(&mut self, duration: u64, winner: Option<String>, condition: &str) {
        self.duration_ticks = duration;
        self.winner = winner;
        self.end_condition = condition.to_string();
    }
}

/// Metrics for one contestant in a match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestantMetrics {
    /// Contestant name.
    pub name: String,

    // === Combat ===
    /// Projectiles launched.
    pub shots_fired: u32,
    /// Projectiles that struck the opponent.
    pub hits_landed: u32,
    /// Opponent projectiles that struck this contestant.
    pub hits_taken: u32,
    /// Near misses survived.
    pub dodges: u32,
    /// Dashes started.
    pub dashes: u32,
    /// Hits landed per shot fired.
    pub accuracy: f64,

    // === Training signal ===
    /// Episode returns summed over all rounds.
    pub total_return: f64,
    /// Seconds spent flagged as stuck.
    pub stuck_seconds: f64,
}

impl ContestantMetrics {
    /// Create new contestant metrics.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Calculate final stats.
    pub fn calculate_derived_stats(&mut self) {
        self.accuracy = if self.shots_fired > 0 {
            f64::from(self.hits_landed) / f64::from(self.shots_fired)
        } else {
            0.0
        };
    }
}

/// Result of one round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, starting at 1.
    pub round: u32,
    /// Tick at which the round ended.
    pub end_tick: u64,
    /// Episode return of each contestant over the round.
    pub returns: HashMap<String, f64>,
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_matches: u32,
    /// Matches won by each contestant.
    pub wins_by_contestant: HashMap<String, u32>,
    /// Win rates by contestant.
    pub win_rates: HashMap<String, f64>,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Draws count.
    pub draws: u32,

    // === Aggregated Stats ===
    /// Average total return per match by contestant.
    pub avg_return: HashMap<String, f64>,
    /// Average hits landed per match by contestant.
    pub avg_hits: HashMap<String, f64>,
    /// Average dodges per match by contestant.
    pub avg_dodges: HashMap<String, f64>,
    /// Average stuck seconds per match by contestant.
    pub avg_stuck_seconds: HashMap<String, f64>,
    /// Average accuracy by contestant, over matches with at least one shot.
    pub avg_accuracy: HashMap<String, f64>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}

impl BatchSummary {
    /// Calculate summary from a list of match metrics.
    #[must_use]
    pub fn from_matches(matches: &[MatchMetrics]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_matches: matches.len() as u32,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut min_duration = u64::MAX;
        let mut max_duration = 0u64;

        let mut returns: HashMap<String, Vec<f64>> = HashMap::new();
        let mut hits: HashMap<String, Vec<f64>> = HashMap::new();
        let mut dodges: HashMap<String, Vec<f64>> = HashMap::new();
        let mut stuck: HashMap<String, Vec<f64>> = HashMap::new();
        let mut accuracy: HashMap<String, Vec<f64>> = HashMap::new();

        for m in matches {
            duration_sum += m.duration_ticks;
            min_duration = min_duration.min(m.duration_ticks);
            max_duration = max_duration.max(m.duration_ticks);

            if let Some(winner) = &m.winner {
                *summary.wins_by_contestant.entry(winner.clone()).or_default() += 1;
            } else {
                summary.draws += 1;
            }

            for (name, c) in &m.contestants {
                returns.entry(name.clone()).or_default().push(c.total_return);
                hits.entry(name.clone())
                    .or_default()
                    .push(f64::from(c.hits_landed));
                dodges
                    .entry(name.clone())
                    .or_default()
                    .push(f64::from(c.dodges));
                stuck.entry(name.clone()).or_default().push(c.stuck_seconds);
                if c.shots_fired > 0 {
                    accuracy.entry(name.clone()).or_default().push(c.accuracy);
                }
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / matches.len() as f64;
        summary.min_duration_ticks = min_duration;
        summary.max_duration_ticks = max_duration;

        for (name, wins) in &summary.wins_by_contestant {
            summary
                .win_rates
                .insert(name.clone(), f64::from(*wins) / f64::from(summary.total_matches));
        }

        let averaged = |series: HashMap<String, Vec<f64>>| {
            series
                .into_iter()
                .map(|(name, values)| (name, mean(&values)))
                .collect::<HashMap<_, _>>()
        };
        summary.avg_return = averaged(returns);
        summary.avg_hits = averaged(hits);
        summary.avg_dodges = averaged(dodges);
        summary.avg_stuck_seconds = averaged(stuck);
        summary.avg_accuracy = averaged(accuracy);

        summary
    }

    /// Check whether every win rate is within `threshold` of 0.5.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates
            .values()
            .all(|rate| (rate - 0.5).abs() <= threshold)
    }

    /// The contestant winning more than `0.5 + threshold` of matches, if any.
    #[must_use]
    pub fn dominant_contestant(&self, threshold: f64) -> Option<&String> {
        self.win_rates
            .iter()
            .find(|(_, rate)| **rate > 0.5 + threshold)
            .map(|(name, _)| name)
    }
}

/// Metrics collector that tracks events during a match.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: MatchMetrics,
    current_tick: u64,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(match_id: &str, scenario: &str, seed: u64) -> Self {
        Self {
            metrics: MatchMetrics::new(match_id, scenario, seed),
            current_tick: 0,
        }
    }

    /// Register a contestant so it appears even with no activity.
    pub fn register(&mut self, name: &str) {
        self.metrics.contestant_mut(name);
    }

    /// Update the current tick.
    pub fn set_tick(&mut self, tick: u64) {
        self.current_tick = tick;
    }

    /// Record a projectile launch.
    pub fn on_shot(&mut self, name: &str) {
        self.metrics.contestant_mut(name).shots_fired += 1;
    }

    /// Record a dash.
    pub fn on_dash(&mut self, name: &str) {
        self.metrics.contestant_mut(name).dashes += 1;
    }

    /// Record a hit.
    pub fn on_hit(&mut self, shooter: &str, victim: &str) {
        self.metrics.contestant_mut(shooter).hits_landed += 1;
        self.metrics.contestant_mut(victim).hits_taken += 1;
    }

    /// Record a near miss.
    pub fn on_dodge(&mut self, name: &str) {
        self.metrics.contestant_mut(name).dodges += 1;
    }

    /// Record `seconds` spent stuck.
    pub fn on_stuck(&mut self, name: &str, seconds: f32) {
        self.metrics.contestant_mut(name).stuck_seconds += f64::from(seconds);
    }

    /// Close a round with each contestant's episode return.
    pub fn on_round_end(&mut self, round: u32, returns: &[(&str, f32)]) {
        let mut record = RoundRecord {
            round,
            end_tick: self.current_tick,
            returns: HashMap::new(),
        };
        for (name, value) in returns {
            let value = f64::from(*value);
            self.metrics.contestant_mut(name).total_return += value;
            record.returns.insert((*name).to_string(), value);
        }
        self.metrics.rounds.push(record);
        self.metrics.rounds_played = round;
    }

    /// Finalize and return the metrics.
    #[must_use]
    pub fn finalize(mut self, winner: Option<String>, condition: &str, state_hash: u64) -> MatchMetrics {
        self.metrics.finalize(self.current_tick, winner, condition);
        self.metrics.final_state_hash = state_hash;

        for contestant in self.metrics.contestants.values_mut() {
            contestant.calculate_derived_stats();
        }

        self.metrics
    }

    /// Get current metrics (immutable).
    #[must_use]
    pub fn current(&self) -> &MatchMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_metrics_new() {
        let metrics = MatchMetrics::new("match_001", "training", 12345);
        assert_eq!(metrics.match_id, "match_001");
        assert_eq!(metrics.seed, 12345);
        assert!(metrics.winner.is_none());
    }

    #[test]
    fn test_accuracy_calculation() {
        let mut c = ContestantMetrics::new("blue");
        c.shots_fired = 4;
        c.hits_landed = 1;
        c.calculate_derived_stats();
        assert!((c.accuracy - 0.25).abs() < 1e-9);

        let mut idle = ContestantMetrics::new("red");
        idle.calculate_derived_stats();
        assert_eq!(idle.accuracy, 0.0);
    }

    #[test]
    fn test_batch_summary() {
        let mut m1 = MatchMetrics::new("m1", "test", 1);
        m1.winner = Some("blue".to_string());
        m1.duration_ticks = 1000;
        m1.contestant_mut("blue").total_return = 4.0;

        let mut m2 = MatchMetrics::new("m2", "test", 2);
        m2.duration_ticks = 3000;
        m2.contestant_mut("blue").total_return = 2.0;

        let summary = BatchSummary::from_matches(&[m1, m2]);

        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.wins_by_contestant.get("blue"), Some(&1));
        assert!((summary.win_rates["blue"] - 0.5).abs() < 1e-9);
        assert!((summary.avg_duration_ticks - 2000.0).abs() < 1e-9);
        assert_eq!(summary.min_duration_ticks, 1000);
        assert_eq!(summary.max_duration_ticks, 3000);
        assert!((summary.avg_return["blue"] - 3.0).abs() < 1e-9);
        assert!(summary.avg_accuracy.is_empty());
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_matches(&[]);
        assert_eq!(summary.total_matches, 0);
        assert!(summary.win_rates.is_empty());
    }

    #[test]
    fn test_balance_check() {
        let mut summary = BatchSummary::default();
        summary.win_rates.insert("blue".to_string(), 0.52);
        summary.win_rates.insert("red".to_string(), 0.48);

        assert!(summary.is_balanced(0.1));
        assert!(!summary.is_balanced(0.01));
        assert!(summary.dominant_contestant(0.1).is_none());
        assert_eq!(summary.dominant_contestant(0.01).map(String::as_str), Some("blue"));
    }

    #[test]
    fn test_metrics_collector() {
        let mut collector = MetricsCollector::new("test", "training", 42);
        collector.register("red");
        collector.on_shot("blue");
        collector.on_shot("blue");
        collector.on_hit("blue", "red");
        collector.on_dodge("red");
        collector.on_stuck("red", 0.5);
        collector.set_tick(3000);
        collector.on_round_end(1, &[("blue", 1.5), ("red", -0.75)]);

        let metrics = collector.finalize(Some("blue".to_string()), "score_target", 7);

        assert_eq!(metrics.duration_ticks, 3000);
        assert_eq!(metrics.rounds_played, 1);
        assert_eq!(metrics.final_state_hash, 7);
        let blue = &metrics.contestants["blue"];
        assert_eq!(blue.hits_landed, 1);
        assert!((blue.accuracy - 0.5).abs() < 1e-9);
        assert!((blue.total_return - 1.5).abs() < 1e-9);
        let red = &metrics.contestants["red"];
        assert_eq!(red.hits_taken, 1);
        assert_eq!(red.dodges, 1);
        assert!((red.stuck_seconds - 0.5).abs() < 1e-9);
        assert_eq!(metrics.rounds[0].end_tick, 3000);
    }
}
