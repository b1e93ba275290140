//! Interval timers and cooldowns.
//!
//! Both are driven by the simulation's delta time rather than a wall clock,
//! so pausing the simulation pauses them too.

use serde::{Deserialize, Serialize};

/// Fires at a fixed interval, independent of the per-tick update rate.
///
/// Used to throttle expensive work such as proximity scans. Time is fed in
/// through [`IntervalTimer::advance`]; the timer reports how many intervals
/// elapsed during that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalTimer {
    /// Seconds between firings
    interval: f32,
    /// Time accumulated toward the next firing
    accumulator: f32,
    /// Total number of firings so far
    fired: u64,
}

impl IntervalTimer {
    /// Creates a timer whose first firing happens one full interval from now.
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            accumulator: 0.0,
            fired: 0,
        }
    }

    /// Creates a timer that fires on the very first advance.
    #[must_use]
    pub fn immediate(interval: f32) -> Self {
        let mut timer = Self::new(interval);
        timer.accumulator = timer.interval;
        timer
    }

    /// Returns the interval in seconds.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Returns the number of times the timer has fired.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Returns the seconds left until the next firing.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.interval - self.accumulator).max(0.0)
    }

    /// Advances the timer by `dt` seconds.
    ///
    /// Returns how many intervals completed during this step. Callers that
    /// only care whether the timer fired can compare against zero.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            count += 1;
        }
        self.fired += u64::from(count);
        count
    }

    /// Restarts the current interval without changing the firing count.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// A countdown that gates a repeated action, such as an attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Full cooldown length in seconds
    duration: f32,
    /// Seconds left before the action is allowed again
    remaining: f32,
}

impl Cooldown {
    /// Creates a cooldown that starts ready.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }

    /// Returns the full cooldown length.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Returns the seconds left before the cooldown is ready.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Checks if the gated action may run now.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Counts the cooldown down by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Puts the action on cooldown for the full duration.
    pub fn restart(&mut self) {
        self.remaining = self.duration;
    }

    /// Makes the cooldown ready immediately.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}
