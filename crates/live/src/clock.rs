//! Sources of the query time.

use std::sync::atomic::{AtomicU16, Ordering};

use wsr_timetable::ClockTime;

/// Supplies "now" to the live task
pub trait QueryClock: Send + Sync {
    fn now(&self) -> ClockTime;
}

/// Local wall-clock time of the operating line
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl QueryClock for SystemClock {
    fn now(&self) -> ClockTime {
        ClockTime::from(chrono::Local::now().time())
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    minutes: AtomicU16,
}

impl ManualClock {
    pub fn new(start: ClockTime) -> Self {
        Self {
            minutes: AtomicU16::new(start.minutes_since_midnight()),
        }
    }

    pub fn set(&self, time: ClockTime) {
        self.minutes.store(time.minutes_since_midnight(), Ordering::Relaxed);
    }

    /// Move forward, stopping at the last minute of the day
    pub fn advance(&self, minutes: u16) {
        let next = self
            .now()
            .checked_add_minutes(minutes as i32)
            .unwrap_or(ClockTime::at(23, 59));
        self.set(next);
    }
}

impl QueryClock for ManualClock {
    fn now(&self) -> ClockTime {
        ClockTime::from_minutes(self.minutes.load(Ordering::Relaxed)).unwrap_or(ClockTime::MIDNIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(ClockTime::at(10, 15));
        assert_eq!(clock.now(), ClockTime::at(10, 15));

        clock.advance(5);
        assert_eq!(clock.now(), ClockTime::at(10, 20));

        clock.set(ClockTime::at(23, 50));
        clock.advance(30);
        assert_eq!(clock.now(), ClockTime::at(23, 59));
    }
}
