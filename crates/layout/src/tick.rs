//! Tick sources for animated runs.
//!
//! The engine never schedules itself. Anything that can answer "is there
//! another tick?" can drive a [`crate::Simulation`] or a [`crate::Slider`]:
//! a fixed-rate timer, a game loop, or a test calling it a set number of
//! times.

use std::thread;
use std::time::{Duration, Instant};

pub trait TickSource {
    /// Block until the next tick is due. `false` stops the driver, leaving
    /// any run paused where it is.
    fn next_tick(&mut self) -> bool;
}

/// Yields a fixed number of ticks immediately.
#[derive(Debug, Clone)]
pub struct CountedTicks {
    remaining: u64,
}

impl CountedTicks {
    pub fn new(count: u64) -> Self {
        Self { remaining: count }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl TickSource for CountedTicks {
    fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Fixed-rate ticks, optionally limited to a number of ticks.
#[derive(Debug, Clone)]
pub struct IntervalTicks {
    interval: Duration,
    limit: Option<u64>,
    issued: u64,
    next_due: Option<Instant>,
}

impl IntervalTicks {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
            issued: 0,
            next_due: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl TickSource for IntervalTicks {
    fn next_tick(&mut self) -> bool {
        if self.limit.is_some_and(|limit| self.issued >= limit) {
            return false;
        }
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + self.interval);
        self.issued += 1;
        true
    }
}

impl<F: FnMut() -> bool> TickSource for F {
    fn next_tick(&mut self) -> bool {
        self()
    }
}
