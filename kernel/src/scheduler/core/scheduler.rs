//! Cooperative single-CPU scheduler
//!
//! Owns the thread table, the FIFO ready queue and the identity of the
//! running thread. Thread 0 is the idle thread: it runs whenever nothing
//! else is ready and is never queued.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use crate::logger;
use crate::scheduler::thread::{validate_transition, ThreadHandle, ThreadId, ThreadState};
use crate::scheduler::ThreadSystem;
use crate::sync::{InterruptControl, InterruptFlag};

/// Idle thread, runs when the ready queue is empty
pub const IDLE_THREAD: ThreadId = 0;

/// Boot thread, running when the scheduler is created
pub const MAIN_THREAD: ThreadId = 1;

struct ThreadEntry {
    name: String,
    state: ThreadState,
}

struct RunState {
    threads: BTreeMap<ThreadId, ThreadEntry>,
    ready: VecDeque<ThreadId>,
    current: ThreadId,
    next_id: ThreadId,
    /// Every `make_ready`, in call order
    wake_log: Vec<ThreadId>,
    yields: u64,
}

impl RunState {
    fn new() -> Self {
        let mut threads = BTreeMap::new();
        threads.insert(
            IDLE_THREAD,
            ThreadEntry { name: String::from("idle"), state: ThreadState::Ready },
        );
        threads.insert(
            MAIN_THREAD,
            ThreadEntry { name: String::from("main"), state: ThreadState::Running },
        );
        Self {
            threads,
            ready: VecDeque::new(),
            current: MAIN_THREAD,
            next_id: MAIN_THREAD + 1,
            wake_log: Vec::new(),
            yields: 0,
        }
    }

    fn state_of(&self, id: ThreadId) -> Option<ThreadState> {
        self.threads.get(&id).map(|t| t.state)
    }

    fn transition(&mut self, id: ThreadId, to: ThreadState) {
        let entry = self.threads.get_mut(&id);
        crate::alarm_assert!(entry.is_some(), "transition on unknown thread");
        if let Some(entry) = entry {
            crate::alarm_assert!(
                validate_transition(entry.state, to),
                format!("thread {} ({}) cannot go {} -> {}", id, entry.name, entry.state, to)
            );
            entry.state = to;
        }
    }

    /// Run the next ready thread (or idle) in place of the current one
    fn switch_to_next(&mut self) {
        let next = self.ready.pop_front().unwrap_or(IDLE_THREAD);
        if let Some(entry) = self.threads.get_mut(&next) {
            entry.state = ThreadState::Running;
        }
        log::trace!("[SCHED] switch {} -> {}", self.current, next);
        self.current = next;
    }
}

struct SchedCore {
    run: Mutex<RunState>,
    irq: Arc<InterruptFlag>,
}

/// The simulated scheduler
#[derive(Clone)]
pub struct SimScheduler {
    core: Arc<SchedCore>,
}

impl SimScheduler {
    pub fn new(irq: Arc<InterruptFlag>) -> Self {
        Self {
            core: Arc::new(SchedCore {
                run: Mutex::new(RunState::new()),
                irq,
            }),
        }
    }

    /// Create a thread and append it to the ready queue
    pub fn spawn(&self, name: &str) -> SimThread {
        let mut run = self.core.run.lock();
        let id = run.next_id;
        run.next_id += 1;
        run.threads.insert(id, ThreadEntry { name: String::from(name), state: ThreadState::Ready });
        run.ready.push_back(id);
        drop(run);

        logger::debug(&format!("[SCHED] Thread '{}' (TID {}) spawned", name, id));
        self.handle(id)
    }

    /// Kill a thread in whatever state it is in
    pub fn terminate(&self, id: ThreadId) {
        let mut run = self.core.run.lock();
        run.transition(id, ThreadState::Terminated);
        run.ready.retain(|&tid| tid != id);
        if run.current == id {
            run.switch_to_next();
        }
        drop(run);

        logger::debug(&format!("[SCHED] Thread {} terminated", id));
    }

    /// Handle for an existing thread id
    pub fn handle(&self, id: ThreadId) -> SimThread {
        SimThread { id, core: self.core.clone() }
    }

    pub fn current_thread_id(&self) -> ThreadId {
        self.core.run.lock().current
    }

    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.core.run.lock().state_of(id)
    }

    /// Ready queue, head first
    pub fn ready_queue(&self) -> Vec<ThreadId> {
        self.core.run.lock().ready.iter().copied().collect()
    }

    /// Threads made ready so far, in wakeup order
    pub fn wake_log(&self) -> Vec<ThreadId> {
        self.core.run.lock().wake_log.clone()
    }

    pub fn yield_count(&self) -> u64 {
        self.core.run.lock().yields
    }
}

impl ThreadSystem for SimScheduler {
    type Handle = SimThread;

    fn current_thread(&self) -> SimThread {
        let id = self.current_thread_id();
        self.handle(id)
    }

    fn yield_current(&self) {
        let mut run = self.core.run.lock();
        run.yields += 1;
        if run.ready.is_empty() {
            return;
        }

        let current = run.current;
        if run.state_of(current) == Some(ThreadState::Running) {
            run.transition(current, ThreadState::Ready);
            if current != IDLE_THREAD {
                run.ready.push_back(current);
            }
        }
        run.switch_to_next();
    }
}

/// Handle to a simulated thread
#[derive(Clone)]
pub struct SimThread {
    id: ThreadId,
    core: Arc<SchedCore>,
}

impl core::fmt::Debug for SimThread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimThread").field("id", &self.id).finish()
    }
}

impl ThreadHandle for SimThread {
    fn id(&self) -> ThreadId {
        self.id
    }

    fn state(&self) -> ThreadState {
        self.core
            .run
            .lock()
            .state_of(self.id)
            .unwrap_or(ThreadState::Terminated)
    }

    fn block(&self) {
        crate::alarm_assert!(
            !self.core.irq.are_enabled(),
            "block() called with interrupts enabled"
        );
        crate::alarm_assert!(self.id != IDLE_THREAD, "idle thread cannot block");

        let mut run = self.core.run.lock();
        crate::alarm_assert!(run.current == self.id, "only the running thread can block");
        run.transition(self.id, ThreadState::Blocked);
        run.switch_to_next();
    }

    fn make_ready(&self) {
        let mut run = self.core.run.lock();
        crate::alarm_assert!(
            run.state_of(self.id) == Some(ThreadState::Blocked),
            "make_ready() on a thread that is not blocked"
        );
        run.transition(self.id, ThreadState::Ready);
        run.ready.push_back(self.id);
        run.wake_log.push(self.id);
    }
}
