//! Simulated machine
//!
//! A single CPU with a tick clock, an interrupt flag, the cooperative
//! scheduler and the periodic timer. Time only moves when `advance` is
//! called; every tick polls the timer, which raises its interrupt if the
//! flag allows it.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::AlarmConfig;
use crate::scheduler::{SimScheduler, SimThread, ThreadId, ThreadState, ThreadSystem};
use crate::sync::{InterruptControl, InterruptFlag, InterruptGuard, InterruptState};
use crate::time::{PeriodicTimer, SimClock, Tick, TickSource};

pub struct SimMachine {
    clock: SimClock,
    irq: Arc<InterruptFlag>,
    scheduler: SimScheduler,
    timer: PeriodicTimer,
}

impl SimMachine {
    pub fn new(config: &AlarmConfig) -> Self {
        let irq = Arc::new(InterruptFlag::new());
        Self {
            clock: SimClock::new(),
            scheduler: SimScheduler::new(irq.clone()),
            irq,
            timer: PeriodicTimer::new(config.timer_interval),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn interrupts(&self) -> &InterruptFlag {
        &self.irq
    }

    pub fn scheduler(&self) -> &SimScheduler {
        &self.scheduler
    }

    pub fn timer(&self) -> &PeriodicTimer {
        &self.timer
    }

    /// Move time forward one tick at a time
    ///
    /// Returns the number of timer interrupts delivered.
    pub fn advance(&self, ticks: Tick) -> usize {
        let mut delivered = 0;
        for _ in 0..ticks {
            let now = self.clock.tick();
            // The CPU masks interrupts while the handler runs
            let enabled = self.irq.are_enabled();
            let _guard = InterruptGuard::new(&*self.irq);
            if self.timer.poll(now, enabled) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Advance until the clock reads `tick` (no-op if already past)
    pub fn run_until(&self, tick: Tick) -> usize {
        let now = self.clock.now();
        self.advance(tick.saturating_sub(now))
    }

    pub fn spawn(&self, name: &str) -> SimThread {
        self.scheduler.spawn(name)
    }

    pub fn terminate(&self, id: ThreadId) {
        self.scheduler.terminate(id)
    }

    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.scheduler.thread_state(id)
    }

    pub fn current_thread_id(&self) -> ThreadId {
        self.scheduler.current_thread_id()
    }

    pub fn ready_queue(&self) -> Vec<ThreadId> {
        self.scheduler.ready_queue()
    }

    pub fn wake_log(&self) -> Vec<ThreadId> {
        self.scheduler.wake_log()
    }

    pub fn yield_count(&self) -> u64 {
        self.scheduler.yield_count()
    }
}

impl TickSource for SimMachine {
    fn now(&self) -> Tick {
        self.clock.now()
    }
}

impl ThreadSystem for SimMachine {
    type Handle = SimThread;

    fn current_thread(&self) -> SimThread {
        self.scheduler.current_thread()
    }

    fn yield_current(&self) {
        self.scheduler.yield_current()
    }
}

impl InterruptControl for SimMachine {
    fn disable(&self) -> InterruptState {
        self.irq.disable()
    }

    fn restore(&self, state: InterruptState) {
        self.irq.restore(state)
    }

    fn are_enabled(&self) -> bool {
        self.irq.are_enabled()
    }
}
