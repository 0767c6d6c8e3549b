//! Tick clock
//!
//! Abstract monotonic time, counted in ticks since boot.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// Tick count since boot
pub type Tick = u64;

/// Monotonic, non-decreasing time source
pub trait TickSource {
    /// Current time in ticks
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

impl<T: TickSource + ?Sized> TickSource for Arc<T> {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Absolute wake time for a sleep requested at `now`
///
/// Zero and negative delays mean "now". Saturates instead of wrapping.
#[inline]
pub fn deadline_after(now: Tick, delay: i64) -> Tick {
    if delay <= 0 {
        now
    } else {
        now.saturating_add(delay as u64)
    }
}

/// Simulated tick counter driven by the machine
pub struct SimClock {
    ticks: AtomicU64,
}

impl SimClock {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// Advance by one tick, returning the new time
    pub fn tick(&self) -> Tick {
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Jump forward; never moves backwards
    pub fn advance_to(&self, tick: Tick) {
        self.ticks.fetch_max(tick, Ordering::AcqRel);
    }
}

impl TickSource for SimClock {
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_after() {
        assert_eq!(deadline_after(5, 0), 5);
        assert_eq!(deadline_after(5, -3), 5);
        assert_eq!(deadline_after(5, 10), 15);
        assert_eq!(deadline_after(Tick::MAX - 1, 10), Tick::MAX);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SimClock::new();
        assert_eq!(clock.tick(), 1);
        clock.advance_to(40);
        clock.advance_to(10);
        assert_eq!(clock.now(), 40);
    }
}
