//! Machine abstraction
//!
//! Everything the alarm consumes from the rest of the kernel, bundled as
//! one trait, plus the simulated machine that implements it.

pub mod sim;

pub use sim::SimMachine;

use crate::scheduler::ThreadSystem;
use crate::sync::InterruptControl;
use crate::time::TickSource;

/// Clock + threads + interrupt masking
pub trait Platform: TickSource + ThreadSystem + InterruptControl {}

impl<T: TickSource + ThreadSystem + InterruptControl + ?Sized> Platform for T {}
