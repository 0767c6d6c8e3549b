//! Alarm - sleep for at least N ticks
//!
//! `wait_until` files the calling thread in the deadline index and blocks
//! it; the periodic timer interrupt drains every deadline that has passed
//! and makes those threads ready again. Wakeup resolution is therefore the
//! timer period, never finer.

use core::sync::atomic::{AtomicU64, Ordering};
use spin::Mutex;

use super::clock::{deadline_after, Tick, TickSource};
use super::deadline::DeadlineIndex;
use super::error::{AlarmError, AlarmResult};
use super::timer::TimerHandler;
use crate::config::AlarmConfig;
use crate::machine::Platform;
use crate::scheduler::{ThreadHandle, ThreadId, ThreadState, ThreadSystem};
use crate::sync::InterruptGuard;

/// Alarm counters
pub struct AlarmStats {
    /// Successful `wait_until` registrations
    pub sleeps: AtomicU64,
    /// Threads moved back to Ready
    pub wakeups: AtomicU64,
    /// Threads found in a bucket but no longer Blocked
    pub skipped: AtomicU64,
    /// Timer interrupts handled
    pub interrupts: AtomicU64,
    /// Buckets removed from the index
    pub buckets_drained: AtomicU64,
    /// Interrupts whose `now` was below the previous one
    pub clock_regressions: AtomicU64,
}

impl AlarmStats {
    pub const fn new() -> Self {
        Self {
            sleeps: AtomicU64::new(0),
            wakeups: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            interrupts: AtomicU64::new(0),
            buckets_drained: AtomicU64::new(0),
            clock_regressions: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> AlarmStatsSnapshot {
        AlarmStatsSnapshot {
            sleeps: self.sleeps.load(Ordering::Relaxed),
            wakeups: self.wakeups.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            interrupts: self.interrupts.load(Ordering::Relaxed),
            buckets_drained: self.buckets_drained.load(Ordering::Relaxed),
            clock_regressions: self.clock_regressions.load(Ordering::Relaxed),
        }
    }
}

impl Default for AlarmStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the alarm counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmStatsSnapshot {
    pub sleeps: u64,
    pub wakeups: u64,
    pub skipped: u64,
    pub interrupts: u64,
    pub buckets_drained: u64,
    pub clock_regressions: u64,
}

/// The sleep/wakeup service
///
/// One instance per kernel, built by `kernel_init` and shared by reference.
pub struct AlarmService<P: Platform> {
    platform: P,
    /// Only touched with interrupts disabled
    index: Mutex<DeadlineIndex<P::Handle>>,
    skip_non_blocked: bool,
    last_now: AtomicU64,
    stats: AlarmStats,
}

impl<P: Platform> AlarmService<P> {
    pub fn new(platform: P, config: &AlarmConfig) -> Self {
        Self {
            platform,
            index: Mutex::new(DeadlineIndex::new()),
            skip_non_blocked: config.skip_non_blocked,
            last_now: AtomicU64::new(0),
            stats: AlarmStats::new(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Put the current thread to sleep for at least `delay` ticks
    ///
    /// The thread becomes ready during the first timer interrupt whose time
    /// is `>= now + delay`. Zero or negative delays wake on the next
    /// interrupt. Interrupts stay disabled from before the deadline is
    /// computed until the thread has blocked, so the timer cannot observe a
    /// filed thread that is not yet Blocked.
    ///
    /// # Panics
    ///
    /// If the current thread already has a pending sleep.
    pub fn wait_until(&self, delay: i64) {
        let _guard = InterruptGuard::new(&self.platform);

        let now = self.platform.now();
        let deadline = deadline_after(now, delay);
        let thread = self.platform.current_thread();
        let id = thread.id();

        let filed = self.index.lock().insert(deadline, thread.clone());
        if let Err(err) = filed {
            // Not filed: blocking now would never be undone
            crate::alarm_fatal!(err);
        }
        self.stats.sleeps.fetch_add(1, Ordering::Relaxed);
        log::debug!("[ALARM] Thread {} sleeps at tick {} until {}", id, now, deadline);

        thread.block();
    }

    /// Timer interrupt handler
    ///
    /// Readies every thread whose deadline is `<= now`, leaves later ones
    /// alone, then yields the running thread. Never blocks.
    pub fn timer_interrupt(&self, now: Tick) {
        self.stats.interrupts.fetch_add(1, Ordering::Relaxed);

        let previous = self.last_now.swap(now, Ordering::AcqRel);
        if now < previous {
            self.stats.clock_regressions.fetch_add(1, Ordering::Relaxed);
            crate::alarm_error!(AlarmError::ClockRegression { previous, now });
        }

        while self.drain_one(now) {}

        self.platform.yield_current();
    }

    /// Pop and ready the earliest bucket if it is due
    ///
    /// Returns false once nothing is due.
    fn drain_one(&self, now: Tick) -> bool {
        let _guard = InterruptGuard::new(&self.platform);

        // Peek again under exclusion before popping
        let popped = {
            let mut index = self.index.lock();
            match index.peek_min() {
                Some(deadline) if deadline <= now => index.pop_min_bucket(),
                _ => return false,
            }
        };

        let (deadline, bucket) = match popped {
            Ok(entry) => entry,
            Err(err) => crate::alarm_fatal!(err),
        };
        self.stats.buckets_drained.fetch_add(1, Ordering::Relaxed);

        for thread in bucket {
            if self.skip_non_blocked {
                let state = thread.state();
                if state != ThreadState::Blocked {
                    self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "[ALARM] Thread {} due at {} is {}, not readied",
                        thread.id(),
                        deadline,
                        state
                    );
                    continue;
                }
            }
            thread.make_ready();
            self.stats.wakeups.fetch_add(1, Ordering::Relaxed);
            log::trace!("[ALARM] Thread {} ready (deadline {}, now {})", thread.id(), deadline, now);
        }
        true
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Tick> {
        let _guard = InterruptGuard::new(&self.platform);
        self.index.lock().peek_min()
    }

    /// Number of sleeping threads
    pub fn pending_threads(&self) -> usize {
        let _guard = InterruptGuard::new(&self.platform);
        self.index.lock().thread_count()
    }

    /// Deadline of a sleeping thread, if it sleeps
    pub fn sleeping_until(&self, id: ThreadId) -> Option<Tick> {
        let _guard = InterruptGuard::new(&self.platform);
        self.index.lock().deadline_of(id)
    }

    pub fn is_sleeping(&self, id: ThreadId) -> bool {
        self.sleeping_until(id).is_some()
    }

    /// Run the index consistency check
    pub fn check_invariants(&self) -> AlarmResult<()> {
        let _guard = InterruptGuard::new(&self.platform);
        self.index.lock().check_invariants()
    }

    pub fn stats(&self) -> AlarmStatsSnapshot {
        self.stats.snapshot()
    }
}

impl<P> TimerHandler for AlarmService<P>
where
    P: Platform + Send + Sync,
    P::Handle: Send,
{
    fn on_timer_interrupt(&self, now: Tick) {
        self.timer_interrupt(now);
    }
}
