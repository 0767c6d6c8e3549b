//! State - Thread state machine
//!
//! The alarm only ever drives `Running -> Blocked` (sleep) and
//! `Blocked -> Ready` (wakeup). Everything else belongs to the scheduler.

use core::fmt;

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Thread is ready to run
    Ready,

    /// Thread is currently running
    Running,

    /// Thread is blocked (sleeping on a deadline, lock, ...)
    Blocked,

    /// Thread has terminated
    Terminated,
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Running => write!(f, "Running"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Validate state transition
pub fn validate_transition(from: ThreadState, to: ThreadState) -> bool {
    use ThreadState::*;

    match (from, to) {
        // Ready -> Running
        (Ready, Running) => true,

        // Running -> Ready (yield)
        (Running, Ready) => true,

        // Running -> Blocked (sleep)
        (Running, Blocked) => true,

        // Blocked -> Ready (wakeup)
        (Blocked, Ready) => true,

        // Anything alive can be killed
        (Ready | Running | Blocked, Terminated) => true,

        // All other transitions invalid
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(alloc::format!("{}", ThreadState::Blocked), "Blocked");
    }

    #[test]
    fn test_sleep_cycle_transitions() {
        use ThreadState::*;
        assert!(validate_transition(Running, Blocked));
        assert!(validate_transition(Blocked, Ready));
        assert!(!validate_transition(Ready, Blocked));
        assert!(!validate_transition(Terminated, Ready));
        assert!(!validate_transition(Blocked, Running));
    }
}
