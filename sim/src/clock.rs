//! Wall-clock sources for the engine loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source, in milliseconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Real time measured from clock creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for tests and replay.
///
/// Clones share the same time, so a caller keeps one handle and gives the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { time: Rc::new(Cell::new(start)) }
    }

    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    pub fn advance(&self, delta: f64) {
        self.time.set(self.time.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}
