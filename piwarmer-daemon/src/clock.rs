//! Time sources
//!
//! The control loop never calls `Instant::now` or `thread::sleep` directly,
//! so tests can drive it with a manual clock.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use embedded_hal::delay::DelayNs;

/// Monotonic time, wall-clock time and sleeping
pub trait Clock {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Local date and time, used to name runs
    fn wall_clock(&self) -> NaiveDateTime;

    fn sleep(&mut self, duration: Duration);
}

/// The host's clocks
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall_clock(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Blocking `DelayNs` on top of `thread::sleep`
///
/// Used by the thermometer's retry delay on the simulated backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms.into()));
    }
}
