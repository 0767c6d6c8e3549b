//! Scheduler subsystem
//!
//! Thread identity and state as seen by the alarm, plus a single-CPU
//! cooperative scheduler used by the simulated machine.

pub mod core;
pub mod thread;

// Re-exports
pub use self::core::{SimScheduler, SimThread, IDLE_THREAD, MAIN_THREAD};
pub use thread::{ThreadHandle, ThreadId, ThreadState};

use alloc::sync::Arc;

/// Thread services consumed by the alarm
pub trait ThreadSystem {
    type Handle: ThreadHandle;

    /// Handle of the thread executing the caller
    fn current_thread(&self) -> Self::Handle;

    /// Give the CPU to another ready thread, if any
    fn yield_current(&self);
}

impl<T: ThreadSystem + ?Sized> ThreadSystem for &T {
    type Handle = T::Handle;

    fn current_thread(&self) -> Self::Handle {
        (**self).current_thread()
    }

    fn yield_current(&self) {
        (**self).yield_current()
    }
}

impl<T: ThreadSystem + ?Sized> ThreadSystem for Arc<T> {
    type Handle = T::Handle;

    fn current_thread(&self) -> Self::Handle {
        (**self).current_thread()
    }

    fn yield_current(&self) {
        (**self).yield_current()
    }
}
