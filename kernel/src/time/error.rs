//! Alarm Error Handling
//!
//! Error types for the sleep/wakeup core. None of these reach user space:
//! they are contract violations between the alarm and its collaborators.

use super::clock::Tick;
use crate::scheduler::ThreadId;
use core::fmt;

/// Alarm error types with detailed context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmError {
    // ═══════════════════════════════════════════════════════════════
    // Caller contract
    // ═══════════════════════════════════════════════════════════════

    /// Thread already has a pending sleep (at most one bucket per thread)
    AlreadySleeping { thread_id: ThreadId, deadline: Tick },

    // ═══════════════════════════════════════════════════════════════
    // Internal invariants
    // ═══════════════════════════════════════════════════════════════

    /// `pop_min_bucket` on an index with no deadline
    EmptyIndex,

    /// Ordered deadlines and bucket map disagree
    IndexCorrupted { reason: &'static str },

    // ═══════════════════════════════════════════════════════════════
    // Timer source / configuration
    // ═══════════════════════════════════════════════════════════════

    /// Timer reported a time earlier than a previous interrupt
    ClockRegression { previous: Tick, now: Tick },

    /// Rejected configuration
    InvalidConfig { reason: &'static str },
}

impl fmt::Display for AlarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySleeping { thread_id, deadline } => {
                write!(f, "Thread {} already sleeping until tick {}", thread_id, deadline)
            }
            Self::EmptyIndex => write!(f, "Deadline index is empty"),
            Self::IndexCorrupted { reason } => write!(f, "Deadline index corrupted: {}", reason),
            Self::ClockRegression { previous, now } => {
                write!(f, "Clock went backwards: {} -> {}", previous, now)
            }
            Self::InvalidConfig { reason } => write!(f, "Invalid alarm config: {}", reason),
        }
    }
}

impl AlarmError {
    /// Get recovery hint for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AlreadySleeping { .. } => "A thread must be woken before it sleeps again",
            Self::EmptyIndex => "Peek the earliest deadline before popping",
            Self::IndexCorrupted { .. } => "Mutate the index only inside an interrupt guard",
            Self::ClockRegression { .. } => "Check the timer source, it must be monotonic",
            Self::InvalidConfig { .. } => "Fix the alarm configuration",
        }
    }

    /// Get error severity (0-3)
    pub fn severity(&self) -> u8 {
        match self {
            Self::IndexCorrupted { .. } => 3, // Critical
            Self::AlreadySleeping { .. } => 3,
            Self::EmptyIndex => 2,            // Severe
            Self::ClockRegression { .. } => 1, // Warning
            Self::InvalidConfig { .. } => 1,
        }
    }
}

/// Result type for alarm operations
pub type AlarmResult<T> = Result<T, AlarmError>;

/// Log an alarm error with its recovery hint, yielding the error back
///
/// Severity 2 and above go out at error level, the rest at warn level.
#[macro_export]
macro_rules! alarm_error {
    ($err:expr) => {{
        let err = $err;
        let line = alloc::format!("[ALARM] Error: {} (hint: {})", err, err.recovery_hint());
        if err.severity() >= 2 {
            $crate::logger::error(&line);
        } else {
            $crate::logger::warn(&line);
        }
        err
    }};
}

/// Log an error that leaves the alarm unusable, then panic
#[macro_export]
macro_rules! alarm_fatal {
    ($err:expr) => {{
        let err = $crate::alarm_error!($err);
        panic!("[ALARM CRITICAL] Invariant violated: {}", err);
    }};
}

/// Macro for critical alarm assertions
#[macro_export]
macro_rules! alarm_assert {
    ($cond:expr, $reason:expr) => {
        if !$cond {
            panic!("[ALARM CRITICAL] Invariant violated: {}", $reason);
        }
    };
}
