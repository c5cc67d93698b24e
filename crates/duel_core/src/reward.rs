//! Reward shaping.
//!
//! [`RewardShaper::score`] is a pure function of one tick's measurements. It
//! returns every term separately in a [`RewardBreakdown`] so training code can
//! log and tune them individually.
//!
//! Continuous terms are configured as rates per second and scaled by the
//! tick length, so the reward collected over a second of play does not depend
//! on the tick rate. The wall-cap penalty and the terminal events are
//! one-shot amounts.
//!
//! | term | sign | condition |
//! |---|---|---|
//! | distance | ± | always, peaks at the optimal distance |
//! | excess distance | − | beyond the excess distance |
//! | aim | + | facing alignment above the threshold |
//! | proximity | + | inside the proximity range |
//! | visibility | + | opponent in line of sight |
//! | concealment | + | opponent cannot see this agent |
//! | invisibility | − | opponent unseen for too long, escalating |
//! | passivity | − | no offensive action for too long |
//! | wall near / cap / close | − | hugging walls |
//! | stuck | − | stuck for too long |

use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;
use crate::counters::ExposureCounters;
use crate::math::non_negative;

/// Measurements that only exist while an opponent is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    /// Horizontal distance to the opponent.
    pub distance: f32,
    /// Dot product of the facing with the direction to the opponent.
    pub aim_alignment: f32,
    /// This agent has line of sight to the opponent.
    pub in_sight: bool,
    /// The opponent has line of sight to this agent.
    pub seen_by_opponent: bool,
}

/// Everything the shaper looks at for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardInputs {
    /// Tick length in seconds.
    pub dt: f32,
    /// Opponent measurements; `None` yields zero shaping.
    pub engagement: Option<Engagement>,
    /// Exposure counters after this tick's updates.
    pub counters: ExposureCounters,
    /// A wall is within the near-wall radius.
    pub near_wall: bool,
    /// Nearest wall in the forward half plane, if within probe range.
    pub forward_wall_distance: Option<f32>,
    /// Stuck detector verdict.
    pub is_stuck: bool,
    /// Length of the current low-movement streak.
    pub stuck_duration: f32,
}

/// Per-term shaping reward for one tick. Penalties are negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Distance-to-optimal term.
    pub distance: f32,
    /// Excess-distance penalty.
    pub excess_distance: f32,
    /// Aim-alignment bonus.
    pub aim: f32,
    /// Proximity-engagement bonus.
    pub proximity: f32,
    /// Line-of-sight bonus.
    pub visibility: f32,
    /// Out-of-sight micro bonus.
    pub concealment: f32,
    /// Escalating invisibility penalty.
    pub invisibility: f32,
    /// Passivity penalty.
    pub passivity: f32,
    /// Continuous near-wall penalty.
    pub wall_near: f32,
    /// One-shot penalty when the near-wall duration crosses a cap multiple.
    pub wall_cap: f32,
    /// Very-close wall penalty.
    pub wall_close: f32,
    /// Stuck penalty.
    pub stuck: f32,
}

impl RewardBreakdown {
    /// Sum of every term.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.distance
            + self.excess_distance
            + self.aim
            + self.proximity
            + self.visibility
            + self.concealment
            + self.invisibility
            + self.passivity
            + self.wall_near
            + self.wall_cap
            + self.wall_close
            + self.stuck
    }
}

/// Reward for a discrete combat outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalEvent {
    /// This agent's projectile struck the opponent.
    HitLanded,
    /// This agent was struck.
    HitTaken,
    /// A projectile passed close by without hitting.
    Dodged,
}

/// Stateless reward calculator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardShaper {
    config: RewardConfig,
}

impl RewardShaper {
    /// Shaper with the given magnitudes.
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Reward magnitudes.
    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Largest net shaping reward one tick of length `dt` can yield.
    #[must_use]
    pub fn max_shaping_magnitude(&self, dt: f32) -> f32 {
        self.config.max_shaping_magnitude(non_negative(dt))
    }

    /// Score one tick.
    #[must_use]
    pub fn score(&self, inputs: &RewardInputs) -> RewardBreakdown {
        let Some(engagement) = inputs.engagement else {
            return RewardBreakdown::default();
        };
        let c = &self.config;
        let dt = non_negative(inputs.dt);
        let counters = &inputs.counters;
        let distance = non_negative(engagement.distance);
        let mut r = RewardBreakdown::default();

        let closeness = 1.0 - (distance - c.optimal_distance).abs() / c.optimal_distance;
        r.distance = c.distance_rate * closeness.clamp(-1.0, 1.0) * dt;

        if distance > c.excess_distance {
            r.excess_distance = -c.excess_distance_rate * dt;
        }

        let alignment = if engagement.aim_alignment.is_finite() {
            engagement.aim_alignment.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        if alignment > c.aim_threshold {
            r.aim = c.aim_rate * alignment * dt;
        }

        if distance < c.proximity_range {
            r.proximity = c.proximity_rate * (c.proximity_range - distance) / c.proximity_range * dt;
        }

        if engagement.in_sight {
            r.visibility = c.visibility_rate * dt;
        }
        if !engagement.seen_by_opponent {
            r.concealment = c.concealment_rate * dt;
        }

        let unseen = counters.time_since_target_visible;
        if unseen >= c.invisibility_threshold {
            let escalation = 1.0 + (unseen - c.invisibility_threshold) / c.invisibility_threshold;
            r.invisibility =
                -c.invisibility_rate * escalation.min(c.invisibility_max_multiplier) * dt;
        }

        if counters.time_since_last_offensive_action >= c.passivity_threshold {
            r.passivity = -c.passivity_rate * dt;
        }

        if inputs.near_wall {
            r.wall_near = -c.wall_near_rate * dt;
            let now = counters.wall_proximity_time;
            let before = non_negative(now - dt);
            if (now / c.wall_cap_time).floor() > (before / c.wall_cap_time).floor() {
                r.wall_cap = -c.wall_cap_penalty;
            }
        }
        if inputs
            .forward_wall_distance
            .is_some_and(|d| d < c.wall_close_distance)
        {
            r.wall_close = -c.wall_close_rate * dt;
        }

        if inputs.is_stuck && inputs.stuck_duration > c.stuck_threshold {
            r.stuck = -c.stuck_rate * dt;
        }

        if !r.total().is_finite() {
            tracing::warn!(?inputs, "Non-finite shaping reward, dropping tick");
            return RewardBreakdown::default();
        }
        r
    }

    /// Reward for a terminal event.
    #[must_use]
    pub fn terminal(&self, event: TerminalEvent) -> f32 {
        match event {
            TerminalEvent::HitLanded => self.config.hit_landed.abs(),
            TerminalEvent::HitTaken => -self.config.hit_taken.abs(),
            TerminalEvent::Dodged => self.config.dodge.abs(),
        }
    }
}

/// Accumulated reward of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodeReturn {
    /// Sum of every reward added this episode.
    pub total: f32,
    /// Reward added since the last [`EpisodeReturn::take_step`].
    pub step: f32,
    /// Number of shaping ticks scored.
    pub ticks: u64,
}

impl EpisodeReturn {
    /// Add a reward.
    pub fn add(&mut self, reward: f32) {
        if reward.is_finite() {
            self.total += reward;
            self.step += reward;
        }
    }

    /// Add a tick's shaping reward.
    pub fn add_tick(&mut self, breakdown: &RewardBreakdown) {
        self.add(breakdown.total());
        self.ticks += 1;
    }

    /// Read and clear the reward gathered since the last call.
    pub fn take_step(&mut self) -> f32 {
        std::mem::take(&mut self.step)
    }

    /// Start a new episode. Reward not yet taken with
    /// [`EpisodeReturn::take_step`] is kept for the next read.
    pub fn reset(&mut self) {
        *self = Self {
            step: self.step,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn engaged(distance: f32) -> RewardInputs {
        RewardInputs {
            dt: DT,
            engagement: Some(Engagement {
                distance,
                aim_alignment: 1.0,
                in_sight: true,
                seen_by_opponent: true,
            }),
            counters: ExposureCounters::default(),
            near_wall: false,
            forward_wall_distance: None,
            is_stuck: false,
            stuck_duration: 0.0,
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_ideal_engagement_reward() {
        let shaper = RewardShaper::default();
        let r = shaper.score(&engaged(7.0));
        assert!(close(r.distance, 0.4 * DT));
        assert!(close(r.aim, 0.8 * DT));
        assert!(close(r.proximity, 0.4 * 5.0 / 12.0 * DT));
        assert!(close(r.visibility, 0.6 * DT));
        assert_eq!(r.concealment, 0.0);
        assert_eq!(r.excess_distance, 0.0);
        let expected = (0.4 + 0.8 + 0.4 * 5.0 / 12.0 + 0.6) * DT;
        assert!(close(r.total(), expected));
    }

    #[test]
    fn test_shaping_stays_within_bound() {
        let shaper = RewardShaper::default();
        let bound = shaper.max_shaping_magnitude(DT);
        assert_eq!(bound, shaper.config().max_shaping_magnitude(DT));
        for distance in [0.0, 3.0, 7.0, 15.0, 40.0] {
            let mut inputs = engaged(distance);
            assert!(shaper.score(&inputs).total().abs() <= bound + 1e-6);
            inputs.is_stuck = true;
            inputs.stuck_duration = 2.5;
            inputs.near_wall = true;
            assert!(shaper.score(&inputs).total().abs() <= bound + 1e-6);
        }
        assert_eq!(shaper.max_shaping_magnitude(-1.0), shaper.max_shaping_magnitude(0.0));
    }

    #[test]
    fn test_no_opponent_is_zero() {
        let mut inputs = engaged(7.0);
        inputs.engagement = None;
        inputs.is_stuck = true;
        inputs.stuck_duration = 10.0;
        assert_eq!(RewardShaper::default().score(&inputs).total(), 0.0);
    }

    #[test]
    fn test_far_opponent_penalised() {
        let r = RewardShaper::default().score(&engaged(30.0));
        assert!(close(r.distance, -0.4 * DT));
        assert!(close(r.excess_distance, -0.4 * DT));
        assert_eq!(r.proximity, 0.0);
    }

    #[test]
    fn test_invisibility_escalates_to_cap() {
        let shaper = RewardShaper::default();
        let mut inputs = engaged(7.0);
        inputs.counters.time_since_target_visible = 2.9;
        assert_eq!(shaper.score(&inputs).invisibility, 0.0);
        inputs.counters.time_since_target_visible = 3.0;
        assert!(close(shaper.score(&inputs).invisibility, -0.25 * DT));
        inputs.counters.time_since_target_visible = 4.5;
        assert!(close(shaper.score(&inputs).invisibility, -0.25 * 1.5 * DT));
        inputs.counters.time_since_target_visible = 100.0;
        assert!(close(shaper.score(&inputs).invisibility, -0.25 * 2.0 * DT));
    }

    #[test]
    fn test_wall_cap_fires_once_per_crossing() {
        let shaper = RewardShaper::default();
        let mut inputs = engaged(7.0);
        inputs.dt = 0.5;
        inputs.near_wall = true;
        let mut caps = 0;
        let mut counters = ExposureCounters::default();
        for _ in 0..14 {
            counters.observe_wall(true, 0.5);
            inputs.counters = counters;
            let r = shaper.score(&inputs);
            assert!(r.wall_near < 0.0);
            if r.wall_cap < 0.0 {
                caps += 1;
            }
        }
        // 7 seconds near the wall crosses 3s and 6s.
        assert_eq!(caps, 2);
    }

    #[test]
    fn test_stuck_and_passivity() {
        let shaper = RewardShaper::default();
        let mut inputs = engaged(7.0);
        inputs.is_stuck = true;
        inputs.stuck_duration = 2.0;
        assert_eq!(shaper.score(&inputs).stuck, 0.0);
        inputs.stuck_duration = 2.5;
        assert!(close(shaper.score(&inputs).stuck, -1.0 * DT));

        inputs.counters.time_since_last_offensive_action = 5.0;
        assert!(close(shaper.score(&inputs).passivity, -0.5 * DT));
    }

    #[test]
    fn test_concealment_and_close_wall() {
        let shaper = RewardShaper::default();
        let mut inputs = engaged(7.0);
        inputs.engagement = inputs.engagement.map(|e| Engagement {
            seen_by_opponent: false,
            ..e
        });
        inputs.forward_wall_distance = Some(0.5);
        let r = shaper.score(&inputs);
        assert!(close(r.concealment, 0.015 * DT));
        assert!(close(r.wall_close, -0.5 * DT));
    }

    #[test]
    fn test_rate_independence() {
        let shaper = RewardShaper::default();
        let mut fine = 0.0;
        for _ in 0..50 {
            fine += shaper.score(&engaged(5.0)).total();
        }
        let mut coarse_inputs = engaged(5.0);
        coarse_inputs.dt = 0.5;
        let coarse = 2.0 * shaper.score(&coarse_inputs).total();
        assert!((fine - coarse).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_inputs_are_safe() {
        let mut inputs = engaged(f32::NAN);
        inputs.engagement = inputs.engagement.map(|e| Engagement {
            aim_alignment: f32::INFINITY,
            ..e
        });
        assert!(RewardShaper::default().score(&inputs).total().is_finite());
    }

    #[test]
    fn test_terminal_signs() {
        let shaper = RewardShaper::default();
        assert_eq!(shaper.terminal(TerminalEvent::HitLanded), 1.0);
        assert_eq!(shaper.terminal(TerminalEvent::HitTaken), -1.0);
        assert_eq!(shaper.terminal(TerminalEvent::Dodged), 0.3);
    }

    #[test]
    fn test_episode_return() {
        let mut ret = EpisodeReturn::default();
        ret.add(1.0);
        ret.add(f32::NAN);
        ret.add_tick(&RewardBreakdown {
            aim: 0.5,
            ..RewardBreakdown::default()
        });
        assert_eq!(ret.total, 1.5);
        assert_eq!(ret.ticks, 1);
        assert_eq!(ret.take_step(), 1.5);
        assert_eq!(ret.take_step(), 0.0);
        ret.reset();
        assert_eq!(ret.total, 0.0);
    }

    #[test]
    fn test_reset_keeps_untaken_step() {
        let mut ret = EpisodeReturn::default();
        ret.add(0.75);
        ret.reset();
        assert_eq!(ret.total, 0.0);
        assert_eq!(ret.ticks, 0);
        assert_eq!(ret.take_step(), 0.75);
        assert_eq!(ret.take_step(), 0.0);
    }
}
