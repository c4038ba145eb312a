//! Polling timers.
//!
//! Nothing in the control core blocks. Every wait is a marker holding the time of the
//! last event, checked against a required interval on each tick.

use embassy_time::{Duration, Instant};

/// Timestamp of the last occurrence of something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    at: Instant,
}

impl Marker {
    pub const fn new(at: Instant) -> Self {
        Self { at }
    }

    /// Move the marker to `now`
    pub fn reset(&mut self, now: Instant) {
        self.at = now;
    }

    pub const fn at(&self) -> Instant {
        self.at
    }

    /// Time since the marker, zero if the clock went backwards
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.at)
    }

    /// At least `interval` has passed
    pub fn has_elapsed(&self, now: Instant, interval: Duration) -> bool {
        self.elapsed(now) >= interval
    }

    /// Strictly more than `interval` has passed
    pub fn has_exceeded(&self, now: Instant, interval: Duration) -> bool {
        self.elapsed(now) > interval
    }
}
