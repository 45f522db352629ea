//! Periodic Timer
//!
//! Paces a loop at a fixed period on the monotonic clock. Each wait target
//! is `previous_target + period`, so scheduling jitter never accumulates.

use crate::SyncError;
use std::time::{Duration, Instant};

/// Outcome of one [`PeriodicTimer::wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Number of periods elapsed since the last reset (1-based)
    pub tick: u64,
    /// How far past the period boundary the caller resumed
    pub lateness: Duration,
}

/// Drift-free periodic timer
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period: Duration,
    /// Anchor set by the last `reset`
    anchor: Option<Instant>,
    /// Next period boundary
    deadline: Option<Instant>,
    ticks: u64,
}

impl PeriodicTimer {
    /// Create a timer with the given period
    pub fn new(period: Duration) -> Result<Self, SyncError> {
        if period.is_zero() {
            return Err(SyncError::InvalidPeriod("period must be non-zero".to_string()));
        }
        Ok(Self {
            period,
            anchor: None,
            deadline: None,
            ticks: 0,
        })
    }

    /// Period given in seconds
    pub fn from_secs_f64(seconds: f64) -> Result<Self, SyncError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(SyncError::InvalidPeriod(format!("{} s", seconds)));
        }
        Self::new(Duration::from_secs_f64(seconds))
    }

    /// Period given in milliseconds
    pub fn from_millis(millis: u64) -> Result<Self, SyncError> {
        Self::new(Duration::from_millis(millis))
    }

    /// Period given as a rate in Hz
    pub fn from_hz(hz: f64) -> Result<Self, SyncError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(SyncError::InvalidPeriod(format!("{} Hz", hz)));
        }
        Self::new(Duration::from_secs_f64(1.0 / hz))
    }

    /// Anchor the timer to now; the first boundary is one period away
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// Anchor the timer to an explicit instant
    pub fn reset_at(&mut self, anchor: Instant) {
        self.anchor = Some(anchor);
        self.deadline = Some(anchor + self.period);
        self.ticks = 0;
    }

    /// Block until the next period boundary.
    ///
    /// Resets implicitly on first use. If the caller has fallen behind by
    /// several periods, successive calls return immediately until the
    /// schedule is caught up.
    pub fn wait(&mut self) -> TimerTick {
        if self.deadline.is_none() {
            self.reset();
        }
        let deadline = self.deadline.unwrap_or_else(|| Instant::now() + self.period);

        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        let lateness = Instant::now().saturating_duration_since(deadline);

        self.ticks += 1;
        self.deadline = Some(deadline + self.period);

        TimerTick {
            tick: self.ticks,
            lateness,
        }
    }

    /// Configured period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Periods waited since the last reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Next period boundary, if the timer has been anchored
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Anchor of the current schedule
    pub fn anchor(&self) -> Option<Instant> {
        self.anchor
    }
}
