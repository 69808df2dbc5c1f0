//! Injectable time sources.
//!
//! - `Clock`: wall-clock reads (event timestamps, cache expiry)
//! - `Delay`: suspension for a number of abstract time units (simulated
//!   provider latency)
//!
//! Production code uses `SystemClock` and `TokioDelay`; tests use
//! `ManualClock` together with `NoDelay` or `RecordingDelay`.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(ChronoDuration::seconds(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Suspends the caller for a number of abstract time units.
#[async_trait]
pub trait Delay: Send + Sync {
    /// Waits for `units` time units.
    async fn wait(&self, units: u32);
}

/// Delay backed by the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioDelay {
    unit: Duration,
}

impl TokioDelay {
    /// Creates a delay where one unit lasts `unit`.
    #[must_use]
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// One unit per second.
    #[must_use]
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Returns the length of one unit.
    #[must_use]
    pub fn unit(&self) -> Duration {
        self.unit
    }
}

impl Default for TokioDelay {
    fn default() -> Self {
        Self::seconds()
    }
}

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, units: u32) {
        if units == 0 {
            return;
        }
        tokio::time::sleep(self.unit * units).await;
    }
}

/// Delay that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _units: u32) {}
}

/// Delay that returns immediately and records every request.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    requested: Mutex<Vec<u32>>,
}

impl RecordingDelay {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unit counts requested so far, in call order.
    #[must_use]
    pub fn requested(&self) -> Vec<u32> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the total number of units requested.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.requested().iter().sum()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, units: u32) {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(units);
    }
}
