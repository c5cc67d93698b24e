//! Resource timers: reload, dash and dash cooldown.
//!
//! Fire availability is derived from the reload timer instead of being
//! stored, so "can fire" and "reload elapsed" can never disagree.

use serde::{Deserialize, Serialize};

use crate::math::non_negative;

/// Timer expiries observed during one [`CombatTimers::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerEvents {
    /// The reload finished this tick.
    pub reload_completed: bool,
    /// The dash ended this tick.
    pub dash_ended: bool,
}

/// Countdown timers for firing and dashing. All values are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatTimers {
    /// Seconds of dash left; positive while dashing.
    pub dash_remaining: f32,
    /// Seconds until the next dash may start.
    pub dash_cooldown_remaining: f32,
    /// Seconds until the weapon is loaded.
    pub reload_remaining: f32,
}

impl CombatTimers {
    /// Fresh timers: loaded, not dashing, dash ready.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dash_remaining: 0.0,
            dash_cooldown_remaining: 0.0,
            reload_remaining: 0.0,
        }
    }

    /// Whether a shot may be fired.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.reload_remaining <= 0.0
    }

    /// Whether a reload is in progress.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        !self.can_fire()
    }

    /// Whether a dash is in progress.
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.dash_remaining > 0.0
    }

    /// Whether a new dash may start.
    #[must_use]
    pub fn dash_ready(&self) -> bool {
        !self.is_dashing() && self.dash_cooldown_remaining <= 0.0
    }

    /// Fraction of the dash cooldown still remaining, in `[0, 1]`.
    #[must_use]
    pub fn cooldown_fraction(&self, cooldown: f32) -> f32 {
        if cooldown > 0.0 {
            (self.dash_cooldown_remaining / cooldown).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Start a reload. Returns `false` if one is already running.
    pub fn start_reload(&mut self, duration: f32) -> bool {
        if self.is_reloading() {
            return false;
        }
        self.reload_remaining = non_negative(duration);
        true
    }

    /// Start a dash. Returns `false` if dashing or cooling down.
    pub fn start_dash(&mut self, duration: f32, cooldown: f32) -> bool {
        if !self.dash_ready() {
            return false;
        }
        self.dash_remaining = non_negative(duration);
        self.dash_cooldown_remaining = non_negative(cooldown);
        true
    }

    /// Count every timer down by `dt`, clamping at zero.
    pub fn advance(&mut self, dt: f32) -> TimerEvents {
        let dt = non_negative(dt);
        let was_reloading = self.is_reloading();
        let was_dashing = self.is_dashing();

        self.reload_remaining = non_negative(self.reload_remaining - dt);
        self.dash_remaining = non_negative(self.dash_remaining - dt);
        self.dash_cooldown_remaining = non_negative(self.dash_cooldown_remaining - dt);

        TimerEvents {
            reload_completed: was_reloading && self.can_fire(),
            dash_ended: was_dashing && !self.is_dashing(),
        }
    }

    /// Back to spawn defaults.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn hash_into(&self, bits: &mut Vec<u32>) {
        bits.push(self.dash_remaining.to_bits());
        bits.push(self.dash_cooldown_remaining.to_bits());
        bits.push(self.reload_remaining.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reload_cycle() {
        let mut timers = CombatTimers::new();
        assert!(timers.can_fire());
        assert!(timers.start_reload(3.0));
        assert!(!timers.can_fire());
        assert!(!timers.start_reload(3.0));

        let events = timers.advance(2.0);
        assert!(!events.reload_completed);
        let events = timers.advance(1.5);
        assert!(events.reload_completed);
        assert!(timers.can_fire());
        assert_eq!(timers.reload_remaining, 0.0);
    }

    #[test]
    fn test_dash_cycle() {
        let mut timers = CombatTimers::new();
        assert!(timers.start_dash(0.3, 2.0));
        assert!(timers.is_dashing());
        assert!(!timers.start_dash(0.3, 2.0));

        let events = timers.advance(0.5);
        assert!(events.dash_ended);
        assert!(!timers.is_dashing());
        assert!(!timers.dash_ready());
        assert!((timers.cooldown_fraction(2.0) - 0.75).abs() < 1e-6);

        timers.advance(1.5);
        assert!(timers.dash_ready());
        assert_eq!(timers.cooldown_fraction(2.0), 0.0);
    }

    #[test]
    fn test_bad_dt_does_not_rewind() {
        let mut timers = CombatTimers::new();
        timers.start_reload(1.0);
        timers.advance(-5.0);
        timers.advance(f32::NAN);
        assert_eq!(timers.reload_remaining, 1.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Advance(f32),
        Fire(f32),
        Dash(f32, f32),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..1.0).prop_map(Op::Advance),
            (0.0f32..5.0).prop_map(Op::Fire),
            (0.0f32..1.0, 0.0f32..3.0).prop_map(|(d, c)| Op::Dash(d, c)),
        ]
    }

    proptest! {
        #[test]
        fn prop_timers_stay_non_negative_and_consistent(ops in proptest::collection::vec(arb_op(), 0..64)) {
            let mut timers = CombatTimers::new();
            for op in ops {
                match op {
                    Op::Advance(dt) => {
                        let before = timers;
                        timers.advance(dt);
                        prop_assert!(timers.reload_remaining <= before.reload_remaining);
                        prop_assert!(timers.dash_remaining <= before.dash_remaining);
                        prop_assert!(timers.dash_cooldown_remaining <= before.dash_cooldown_remaining);
                    }
                    Op::Fire(duration) => {
                        if timers.can_fire() {
                            timers.start_reload(duration);
                        }
                    }
                    Op::Dash(duration, cooldown) => {
                        timers.start_dash(duration, cooldown);
                    }
                }
                prop_assert!(timers.reload_remaining >= 0.0);
                prop_assert!(timers.dash_remaining >= 0.0);
                prop_assert!(timers.dash_cooldown_remaining >= 0.0);
                prop_assert_eq!(timers.can_fire(), timers.reload_remaining == 0.0);
                prop_assert_eq!(timers.is_dashing(), timers.dash_remaining > 0.0);
            }
        }
    }
}
