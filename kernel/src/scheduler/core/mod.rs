//! Scheduler core module
//!
//! Round-robin ready queue for one simulated CPU. Context switches are
//! bookkeeping only: "running" a thread means it is the one whose calls
//! the test harness is currently making.

pub mod scheduler;

pub use scheduler::{SimScheduler, SimThread, IDLE_THREAD, MAIN_THREAD};
