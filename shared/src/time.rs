use std::time::SystemTime;

use thiserror::Error;

use crate::Millis;

/// Error type for timestamp operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// System time is before UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

pub struct Timestamp;

impl Timestamp {
    /// Returns the current wall-clock time in milliseconds since UNIX epoch.
    ///
    /// # Errors
    /// Returns `TimeError::SystemTimeBeforeEpoch` if system time is before UNIX epoch.
    pub fn try_now() -> Result<Millis, TimeError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as Millis)
            .map_err(|_| TimeError::SystemTimeBeforeEpoch)
    }
}

/// Fires at most once per period, driven by the caller's clock.
#[derive(Clone, Debug)]
pub struct PeriodicTimer {
    period: Millis,
    last: Option<Millis>,
}

impl PeriodicTimer {
    /// A new timer fires on its first check.
    pub fn new(period: Millis) -> Self {
        Self { period, last: None }
    }

    pub fn ringing(&self, now: Millis) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.period,
        }
    }

    pub fn reset(&mut self, now: Millis) {
        self.last = Some(now);
    }

    /// Checks and rearms in one go.
    pub fn fire(&mut self, now: Millis) -> bool {
        if self.ringing(now) {
            self.reset(now);
            true
        } else {
            false
        }
    }

    pub fn period(&self) -> Millis {
        self.period
    }

    pub fn set_period(&mut self, period: Millis) {
        self.period = period;
    }
}
