//! Clock
//!
//! Time source for timestamps and notification expiry.

use std::cell::Cell;

use jiff::{SignedDuration, Timestamp};

/// A source of the current time.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Create a clock stopped at the given instant.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Move the clock forward (or backward for negative durations).
    pub fn advance(&self, by: SignedDuration) {
        if let Ok(next) = self.now.get().checked_add(by) {
            self.now.set(next);
        }
    }

    /// Jump to an instant.
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::default();

        clock.advance(SignedDuration::from_secs(3));

        assert_eq!(clock.now().as_second(), 3);
    }
}
