#![forbid(unsafe_code)]

//! Deterministic frame clock.

use std::time::Duration;

use web_time::Instant;
use weave_element::Tick;

/// Produces [`Tick`]s on a virtual clock that only moves when told to.
///
/// Poll schedules compare tick instants, so advancing the driver by a
/// known amount makes "due after one interval" observable without
/// sleeping.
#[derive(Debug, Clone)]
pub struct TickDriver {
    start: Instant,
    elapsed: Duration,
    frame: u64,
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TickDriver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Duration::ZERO,
            frame: 0,
        }
    }

    /// The current frame without moving the clock.
    #[must_use]
    pub fn current(&self) -> Tick {
        Tick::new(self.now(), self.frame)
    }

    /// Next frame at the same clock reading.
    pub fn tick(&mut self) -> Tick {
        self.advance(Duration::ZERO)
    }

    /// Move the clock forward by `step` and return the next frame.
    pub fn advance(&mut self, step: Duration) -> Tick {
        self.elapsed += step;
        self.frame += 1;
        self.current()
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
