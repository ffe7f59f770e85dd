//! Duration helper with unit-converted accessors.
//!
//! The Hack Hour API reports durations as plain numbers (milliseconds for the
//! clock endpoint, minutes elsewhere). [`Time`] wraps a millisecond count and
//! converts it on read.

use std::time::Duration;

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = MS_PER_SECOND * 60.0;
const MS_PER_HOUR: f64 = MS_PER_MINUTE * 60.0;
const MS_PER_DAY: f64 = MS_PER_HOUR * 24.0;

/// An immutable span of time measured in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time {
    ms: u64,
}

impl Time {
    /// Creates a span from milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self { ms }
    }

    /// Creates a span from whole minutes, saturating at `u64::MAX` milliseconds.
    pub const fn from_minutes(minutes: u64) -> Self {
        Self {
            ms: minutes.saturating_mul(60 * 1000),
        }
    }

    /// Raw millisecond count.
    pub const fn millis(&self) -> u64 {
        self.ms
    }

    /// Seconds.
    pub fn seconds(&self) -> f64 {
        self.ms as f64 / MS_PER_SECOND
    }

    /// Minutes.
    pub fn minutes(&self) -> f64 {
        self.ms as f64 / MS_PER_MINUTE
    }

    /// Hours.
    pub fn hours(&self) -> f64 {
        self.ms as f64 / MS_PER_HOUR
    }

    /// Days.
    pub fn days(&self) -> f64 {
        self.ms as f64 / MS_PER_DAY
    }

    /// Weeks.
    pub fn weeks(&self) -> f64 {
        self.days() / 7.0
    }

    /// Months of exactly 28 days.
    pub fn months(&self) -> f64 {
        self.days() / 28.0
    }

    /// Calendar-average months (365 / 12 days).
    pub fn true_months(&self) -> f64 {
        self.days() / (365.0 / 12.0)
    }

    /// Years of 365 days.
    pub fn years(&self) -> f64 {
        self.days() / 365.0
    }

    /// Converts to a [`Duration`].
    pub const fn as_duration(&self) -> Duration {
        Duration::from_millis(self.ms)
    }
}

impl From<Duration> for Time {
    fn from(duration: Duration) -> Self {
        Self::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<Time> for Duration {
    fn from(time: Time) -> Self {
        time.as_duration()
    }
}
