//! Fixed-tick cadence for grid macro-steps.

use serde::{Deserialize, Serialize};

/// Counts fixed ticks down to the next grid step.
///
/// Fires on the first tick, then every `round(period_s * ticks_per_second)`
/// ticks (at least every tick). Driven only by tick counts, never by a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepScheduler {
    period_ticks: u32,
    remaining: u32,
}

impl StepScheduler {
    /// Scheduler for a period expressed in seconds at a fixed tick rate.
    #[must_use]
    pub fn new(period_s: f32, ticks_per_second: f32) -> Self {
        let ticks = (period_s * ticks_per_second).round();
        let period_ticks = if ticks.is_finite() && ticks >= 1.0 {
            ticks.min(u32::MAX as f32) as u32
        } else {
            1
        };
        Self {
            period_ticks,
            remaining: 0,
        }
    }

    /// Ticks between consecutive steps.
    #[must_use]
    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Ticks left before the next step fires.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance one tick. Returns `true` when a grid step is due now.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            self.remaining = self.period_ticks - 1;
            true
        } else {
            self.remaining -= 1;
            false
        }
    }
}
