//! Timing utilities.

use std::time::{Duration, Instant};

/// Timer for periodic operations, e.g. a stats display cadence.
pub struct Timer {
    interval: Duration,
    last_fire: Instant,
}

impl Timer {
    /// Create a new timer with the given interval.
    pub fn new(interval: Duration) -> Self {
        Timer {
            interval,
            last_fire: Instant::now(),
        }
    }

    /// Check if the timer has expired.
    pub fn expired(&self) -> bool {
        self.last_fire.elapsed() >= self.interval
    }

    /// Reset the timer.
    pub fn reset(&mut self) {
        self.last_fire = Instant::now();
    }

    /// Fire the timer if expired, returning true if it fired.
    pub fn try_fire(&mut self) -> bool {
        if self.expired() {
            self.reset();
            true
        } else {
            false
        }
    }
}
