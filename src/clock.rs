use chrono::Utc;

use crate::entry::Timestamp;

/// Source of the current instant, swapped out in tests.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch wall clocks collapse to the epoch.
        Timestamp::from_datetime(Utc::now()).unwrap_or(Timestamp::EPOCH)
    }
}

#[cfg(test)]
pub use manual::ManualClock;
