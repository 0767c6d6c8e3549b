//! Periodic hardware timer
//!
//! Raises an interrupt roughly every `interval` ticks and hands the current
//! time to the registered handler. An interrupt that falls due while
//! interrupts are masked stays pending and is delivered on the first poll
//! after they are re-enabled.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use spin::Mutex;

use super::clock::Tick;

/// Timer interrupt callback
pub trait TimerHandler: Send + Sync {
    /// Called in interrupt context with the time of delivery
    fn on_timer_interrupt(&self, now: Tick);
}

/// Timer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStats {
    /// Interrupts handed to the handler
    pub delivered: u64,
    /// Polls where a due interrupt had to wait for interrupts to be enabled
    pub deferred: u64,
}

/// The periodic timer device
pub struct PeriodicTimer {
    interval: Tick,
    next_fire: AtomicU64,
    pending: AtomicBool,
    handler: Mutex<Option<Arc<dyn TimerHandler>>>,
    delivered: AtomicU64,
    deferred: AtomicU64,
}

impl PeriodicTimer {
    /// First interrupt fires at `interval`
    pub fn new(interval: Tick) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            next_fire: AtomicU64::new(interval),
            pending: AtomicBool::new(false),
            handler: Mutex::new(None),
            delivered: AtomicU64::new(0),
            deferred: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Tick {
        self.interval
    }

    /// Time at which the next interrupt falls due
    pub fn next_fire(&self) -> Tick {
        self.next_fire.load(Ordering::Acquire)
    }

    /// Install the interrupt handler, replacing any previous one
    pub fn set_interrupt_handler(&self, handler: Arc<dyn TimerHandler>) {
        *self.handler.lock() = Some(handler);
        log::debug!("[TIMER] Interrupt handler installed (interval {} ticks)", self.interval);
    }

    pub fn clear_interrupt_handler(&self) {
        *self.handler.lock() = None;
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Check the timer at time `now`
    ///
    /// Returns true if an interrupt was delivered.
    pub fn poll(&self, now: Tick, interrupts_enabled: bool) -> bool {
        if now >= self.next_fire() {
            self.pending.store(true, Ordering::Release);
        }
        if !self.pending.load(Ordering::Acquire) {
            return false;
        }
        if !interrupts_enabled {
            self.deferred.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.pending.store(false, Ordering::Release);
        self.next_fire.store(now.saturating_add(self.interval), Ordering::Release);
        self.delivered.fetch_add(1, Ordering::Relaxed);

        // Clone out so the handler may reinstall itself
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => {
                log::trace!("[TIMER] Interrupt at tick {}", now);
                handler.on_timer_interrupt(now);
            }
            None => log::trace!("[TIMER] Interrupt at tick {} (no handler)", now),
        }
        true
    }

    pub fn stats(&self) -> TimerStats {
        TimerStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Tick>>,
    }

    impl TimerHandler for Recorder {
        fn on_timer_interrupt(&self, now: Tick) {
            self.seen.lock().push(now);
        }
    }

    #[test]
    fn test_fires_every_interval() {
        let timer = PeriodicTimer::new(10);
        let rec = Arc::new(Recorder::default());
        timer.set_interrupt_handler(rec.clone());

        let fired: Vec<Tick> = (1..=35).filter(|&t| timer.poll(t, true)).collect();
        assert_eq!(fired, alloc::vec![10, 20, 30]);
        assert_eq!(*rec.seen.lock(), alloc::vec![10, 20, 30]);
        assert_eq!(timer.next_fire(), 40);
    }

    #[test]
    fn test_masked_interrupt_is_deferred() {
        let timer = PeriodicTimer::new(10);
        let rec = Arc::new(Recorder::default());
        timer.set_interrupt_handler(rec.clone());

        assert!(!timer.poll(10, false));
        assert!(!timer.poll(11, false));
        assert!(timer.poll(12, true));
        assert_eq!(*rec.seen.lock(), alloc::vec![12]);
        assert_eq!(timer.next_fire(), 22);
        assert_eq!(timer.stats(), TimerStats { delivered: 1, deferred: 2 });
    }

    #[test]
    fn test_fires_without_handler() {
        let timer = PeriodicTimer::new(5);
        assert!(timer.poll(5, true));
        assert!(!timer.has_handler());
        assert_eq!(timer.stats().delivered, 1);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let timer = PeriodicTimer::new(0);
        assert_eq!(timer.interval(), 1);
    }
}
