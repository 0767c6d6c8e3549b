pub mod interrupt;

pub use interrupt::{without_interrupts, InterruptControl, InterruptFlag, InterruptGuard, InterruptState};
