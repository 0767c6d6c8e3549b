//! Thread module

pub mod state;

pub use state::{validate_transition, ThreadState};

/// Thread ID type
pub type ThreadId = u64;

/// Non-owning handle to a kernel thread
///
/// Owned by the thread subsystem; the alarm only keeps clones of it while
/// the thread sleeps.
pub trait ThreadHandle: Clone {
    /// Stable identity of the thread
    fn id(&self) -> ThreadId;

    /// Current scheduling state
    fn state(&self) -> ThreadState;

    /// Suspend the thread (`Running -> Blocked`)
    ///
    /// The caller must hold an interrupt guard; the guard is released only
    /// once the thread runs again.
    fn block(&self);

    /// Mark a blocked thread runnable (`Blocked -> Ready`)
    ///
    /// Callable from interrupt context. Does not switch threads.
    fn make_ready(&self);
}
