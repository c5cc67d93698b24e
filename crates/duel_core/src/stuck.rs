//! Stuck detection.
//!
//! The detector samples the agent's position on its own slow clock rather
//! than every tick. A sample whose displacement falls under the threshold
//! counts as low movement; after enough consecutive low samples the agent is
//! Stuck and stays Stuck until a single sample moves far enough.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::StuckConfig;
use crate::math::{finite_or, non_negative, vec3_bits};

/// Movement phase reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StuckPhase {
    /// Making progress.
    Moving,
    /// Not making progress.
    Stuck,
}

/// Persisted detector state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckState {
    /// Position at the previous sample.
    pub last_sampled_position: Vec3,
    /// Time accumulated toward the next sample.
    pub time_since_last_sample: f32,
    /// Summed sample intervals of the current low-movement streak.
    pub consecutive_low_movement_time: f32,
    /// Number of samples in the current low-movement streak.
    pub low_movement_samples: u32,
    /// Whether the agent is currently stuck.
    pub is_stuck: bool,
    /// Last heading chosen by the avoidance planner.
    pub avoidance_direction: Vec3,
}

impl StuckState {
    /// Fresh state anchored at `position`.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            last_sampled_position: position,
            time_since_last_sample: 0.0,
            consecutive_low_movement_time: 0.0,
            low_movement_samples: 0,
            is_stuck: false,
            avoidance_direction: Vec3::ZERO,
        }
    }

    /// Reset to a fresh state anchored at `position`.
    pub fn reset(&mut self, position: Vec3) {
        *self = Self::new(position);
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> StuckPhase {
        if self.is_stuck {
            StuckPhase::Stuck
        } else {
            StuckPhase::Moving
        }
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.extend(vec3_bits(self.last_sampled_position));
        bits.push(self.time_since_last_sample.to_bits());
        bits.push(self.consecutive_low_movement_time.to_bits());
        bits.push(self.low_movement_samples);
        bits.push(u32::from(self.is_stuck));
        bits.extend(vec3_bits(self.avoidance_direction));
    }
}

/// Outcome of a position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StuckSample {
    /// Distance moved since the previous sample.
    pub displacement: f32,
    /// Phase after the sample.
    pub phase: StuckPhase,
    /// Whether this sample moved the detector from Moving to Stuck.
    pub entered: bool,
}

/// Slow-clock stuck detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckDetector {
    config: StuckConfig,
    state: StuckState,
}

impl StuckDetector {
    /// Detector anchored at `position`.
    #[must_use]
    pub fn new(config: StuckConfig, position: Vec3) -> Self {
        Self {
            config,
            state: StuckState::new(position),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &StuckState {
        &self.state
    }

    /// Whether the agent is stuck.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.state.is_stuck
    }

    /// Length of the current low-movement streak in seconds.
    #[must_use]
    pub fn stuck_duration(&self) -> f32 {
        self.state.consecutive_low_movement_time
    }

    /// Persisted avoidance heading.
    #[must_use]
    pub fn avoidance_direction(&self) -> Vec3 {
        self.state.avoidance_direction
    }

    /// Store a freshly planned avoidance heading.
    pub fn set_avoidance_direction(&mut self, direction: Vec3) {
        self.state.avoidance_direction = finite_or(direction, Vec3::ZERO);
    }

    /// Reset and re-anchor at `position`.
    pub fn reset(&mut self, position: Vec3) {
        self.state.reset(position);
    }

    /// Advance the sampling clock; returns the sample if one was taken.
    pub fn update(&mut self, position: Vec3, dt: f32) -> Option<StuckSample> {
        let interval = self.config.sample_interval;
        self.state.time_since_last_sample =
            non_negative(self.state.time_since_last_sample + non_negative(dt));
        if self.state.time_since_last_sample < interval {
            return None;
        }
        self.state.time_since_last_sample =
            non_negative(self.state.time_since_last_sample - interval).min(interval);

        let position = finite_or(position, self.state.last_sampled_position);
        let displacement = position.distance(self.state.last_sampled_position);
        self.state.last_sampled_position = position;

        let was_stuck = self.state.is_stuck;
        if displacement < self.config.min_displacement {
            self.state.consecutive_low_movement_time += interval;
            self.state.low_movement_samples = self.state.low_movement_samples.saturating_add(1);
            if self.state.low_movement_samples >= self.config.samples_to_stuck {
                self.state.is_stuck = true;
            }
        } else {
            self.state.consecutive_low_movement_time = 0.0;
            self.state.low_movement_samples = 0;
            self.state.is_stuck = false;
        }

        let entered = !was_stuck && self.state.is_stuck;
        if entered {
            tracing::debug!(
                displacement,
                samples = self.state.low_movement_samples,
                "Entered stuck state"
            );
        } else if was_stuck && !self.state.is_stuck {
            tracing::debug!(displacement, "Recovered from stuck state");
        }

        Some(StuckSample {
            displacement,
            phase: self.state.phase(),
            entered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn detector(samples_to_stuck: u32) -> StuckDetector {
        StuckDetector::new(
            StuckConfig {
                samples_to_stuck,
                ..StuckConfig::default()
            },
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_samples_only_on_interval() {
        let mut d = detector(1);
        assert!(d.update(Vec3::ZERO, 0.25).is_none());
        let sample = d.update(Vec3::ZERO, 0.25).unwrap();
        assert_eq!(sample.phase, StuckPhase::Stuck);
        assert!(sample.entered);
        assert_eq!(d.stuck_duration(), 0.5);
    }

    #[test]
    fn test_large_move_resets() {
        let mut d = detector(1);
        d.update(Vec3::ZERO, 0.5);
        d.update(Vec3::ZERO, 0.5);
        assert!(d.is_stuck());
        assert_eq!(d.stuck_duration(), 1.0);

        let sample = d.update(Vec3::new(2.0, 0.0, 0.0), 0.5).unwrap();
        assert_eq!(sample.phase, StuckPhase::Moving);
        assert!(!d.is_stuck());
        assert_eq!(d.stuck_duration(), 0.0);
    }

    #[test]
    fn test_duration_is_not_capped() {
        let mut d = detector(1);
        for _ in 0..100 {
            d.update(Vec3::ZERO, 0.5);
        }
        assert_eq!(d.stuck_duration(), 50.0);
    }

    #[test]
    fn test_non_finite_position_is_ignored() {
        let mut d = detector(1);
        d.update(Vec3::new(3.0, 0.0, 0.0), 0.5);
        d.update(Vec3::splat(f32::NAN), 0.5);
        assert_eq!(d.state().last_sampled_position, Vec3::new(3.0, 0.0, 0.0));
        assert!(d.is_stuck());
    }

    #[test]
    fn test_reset_reanchors() {
        let mut d = detector(1);
        d.update(Vec3::ZERO, 0.5);
        d.set_avoidance_direction(Vec3::X);
        d.reset(Vec3::new(1.0, 0.0, 1.0));
        assert!(!d.is_stuck());
        assert_eq!(d.avoidance_direction(), Vec3::ZERO);
        assert_eq!(d.state().last_sampled_position, Vec3::new(1.0, 0.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_stuck_exactly_at_kth_low_sample(k in 1u32..8, step in 0.0f32..0.49) {
            let mut d = detector(k);
            let mut position = Vec3::ZERO;
            for sample in 1..=k {
                position.x += step;
                let result = d.update(position, 0.5).unwrap();
                prop_assert_eq!(result.phase == StuckPhase::Stuck, sample == k);
                prop_assert_eq!(result.entered, sample == k);
            }
            position.x += 5.0;
            let result = d.update(position, 0.5).unwrap();
            prop_assert_eq!(result.phase, StuckPhase::Moving);
            prop_assert_eq!(d.stuck_duration(), 0.0);
        }
    }
}
