//! Time management subsystem
//!
//! Tick clock, periodic timer, and the alarm that lets threads sleep until
//! a deadline.

pub mod alarm;
pub mod clock;
pub mod deadline;
pub mod error;
pub mod timer;

// Re-exports
pub use alarm::{AlarmService, AlarmStats, AlarmStatsSnapshot};
pub use clock::{deadline_after, SimClock, Tick, TickSource};
pub use deadline::{Bucket, DeadlineIndex};
pub use error::{AlarmError, AlarmResult};
pub use timer::{PeriodicTimer, TimerHandler, TimerStats};
