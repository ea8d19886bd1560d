use std::sync::atomic::{AtomicI32, AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{MAX_TIME, TIME_UNIT_MS};

/// Transmitter clock synchronized to the slot cycle.
///
/// Holds the wrapping 100 ms counter and the accumulated drift
/// correction. All methods take `&self`, so a correction source (an
/// external reference clock) can hold an `Arc<SyncedClock>` and apply
/// deltas without the scheduler lock; a correction becomes visible with
/// the next tick.
#[derive(Debug, Default)]
pub struct SyncedClock {
    /// Last computed time value (100 ms units, wraps at 65536)
    time: AtomicU16,
    /// Accumulated correction in 100 ms units
    delay: AtomicI32,
}

impl SyncedClock {
    /// Creates a clock at time zero with no correction
    pub fn new() -> Self {
        SyncedClock::default()
    }

    /// Current synchronized time in 100 ms units
    pub fn time(&self) -> u16 {
        self.time.load(Ordering::Relaxed)
    }

    /// Accumulated correction in 100 ms units
    pub fn delay(&self) -> i32 {
        self.delay.load(Ordering::Relaxed)
    }

    /// Adds `delta` (100 ms units, may be negative) to the correction
    pub fn correct(&self, delta: i32) {
        self.delay.fetch_add(delta, Ordering::Relaxed);
    }

    /// Recomputes the synchronized time from a wall-clock reading in
    /// 100 ms units
    pub(crate) fn advance(&self, wall_units: u64) -> u16 {
        let corrected = wall_units as i64 + i64::from(self.delay());
        let time = corrected.rem_euclid(i64::from(MAX_TIME)) as u16;
        self.time.store(time, Ordering::Relaxed);
        time
    }

    /// Wall clock in 100 ms units since the Unix epoch
    pub(crate) fn wall_units() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64 / TIME_UNIT_MS)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps_at_max_time() {
        let clock = SyncedClock::new();
        assert_eq!(clock.advance(65536 + 5), 5);
        assert_eq!(clock.time(), 5);
    }

    #[test]
    fn test_correction_applies_on_next_advance() {
        let clock = SyncedClock::new();
        clock.advance(1000);
        assert_eq!(clock.time(), 1000);

        clock.correct(25);
        // stored value unchanged until the next tick recomputes
        assert_eq!(clock.time(), 1000);
        assert_eq!(clock.advance(1000), 1025);
    }

    #[test]
    fn test_negative_correction_wraps_backwards() {
        let clock = SyncedClock::new();
        clock.correct(-10);
        assert_eq!(clock.advance(5), 65531);
    }

    #[test]
    fn test_corrections_accumulate() {
        let clock = SyncedClock::new();
        clock.correct(30);
        clock.correct(-12);
        assert_eq!(clock.delay(), 18);
        assert_eq!(clock.advance(100), 118);
    }
}
