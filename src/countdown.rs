/// Countdown bookkeeping for the watchdog timer.
///
/// Tracks minutes remaining until the target is terminated. Decremented by
/// elapsed wall-clock time once per cycle, clamped at zero. Pure arithmetic,
/// no clocks and no side effects.

/// Remaining-time state for one run. Invariant:
/// `0.0 <= remaining_minutes() <= total_minutes()`.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    total_minutes: u32,
    remaining_minutes: f64,
}

impl CountdownTimer {
    /// Start a countdown of `total_minutes` whole minutes.
    pub fn new(total_minutes: u32) -> Self {
        Self {
            total_minutes,
            remaining_minutes: f64::from(total_minutes),
        }
    }

    /// Subtract `elapsed_wall_ms` of wall time and return the new remainder.
    /// The floor is clamped at `0.0`.
    pub fn tick(&mut self, elapsed_wall_ms: u64) -> f64 {
        self.remaining_minutes -= elapsed_wall_ms as f64 / 60_000.0;
        if self.remaining_minutes < 0.0 {
            self.remaining_minutes = 0.0;
        }
        self.remaining_minutes
    }

    /// True once the countdown has reached zero.
    pub fn is_expired(&self) -> bool {
        self.remaining_minutes <= 0.0
    }

    pub fn remaining_minutes(&self) -> f64 {
        self.remaining_minutes
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }
}
