//! Interrupt masking
//!
//! The atomic-section primitive: while interrupts are disabled the periodic
//! timer callback cannot run, so state shared with it can be mutated.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Token returned by `disable`, restoring the previous state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "interrupts stay disabled until the state is restored"]
pub struct InterruptState {
    was_enabled: bool,
}

impl InterruptState {
    pub const fn was_enabled(self) -> bool {
        self.was_enabled
    }
}

/// Enable/disable interrupts on the current CPU
pub trait InterruptControl {
    /// Disable interrupts, returning what to restore
    fn disable(&self) -> InterruptState;

    /// Restore the state saved by the matching `disable`
    fn restore(&self, state: InterruptState);

    /// Are interrupts currently enabled?
    fn are_enabled(&self) -> bool;
}

impl<T: InterruptControl + ?Sized> InterruptControl for &T {
    fn disable(&self) -> InterruptState {
        (**self).disable()
    }

    fn restore(&self, state: InterruptState) {
        (**self).restore(state)
    }

    fn are_enabled(&self) -> bool {
        (**self).are_enabled()
    }
}

impl<T: InterruptControl + ?Sized> InterruptControl for Arc<T> {
    fn disable(&self) -> InterruptState {
        (**self).disable()
    }

    fn restore(&self, state: InterruptState) {
        (**self).restore(state)
    }

    fn are_enabled(&self) -> bool {
        (**self).are_enabled()
    }
}

/// RAII guard for disabling/restoring interrupts
///
/// Restores on every exit path, unwinding included. Guards nest: only the
/// outermost one re-enables.
pub struct InterruptGuard<'a, I: InterruptControl + ?Sized> {
    ctl: &'a I,
    saved: InterruptState,
}

impl<'a, I: InterruptControl + ?Sized> InterruptGuard<'a, I> {
    pub fn new(ctl: &'a I) -> Self {
        let saved = ctl.disable();
        Self { ctl, saved }
    }

    /// State that will be restored on drop
    pub fn saved(&self) -> InterruptState {
        self.saved
    }
}

impl<'a, I: InterruptControl + ?Sized> Drop for InterruptGuard<'a, I> {
    fn drop(&mut self) {
        self.ctl.restore(self.saved);
    }
}

/// Execute a closure with interrupts disabled
pub fn without_interrupts<I, F, R>(ctl: &I, f: F) -> R
where
    I: InterruptControl + ?Sized,
    F: FnOnce() -> R,
{
    let _guard = InterruptGuard::new(ctl);
    f()
}

/// Simulated CPU interrupt flag (IF bit)
pub struct InterruptFlag {
    enabled: AtomicBool,
}

impl InterruptFlag {
    /// Interrupts start enabled
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl InterruptControl for InterruptFlag {
    fn disable(&self) -> InterruptState {
        InterruptState { was_enabled: self.enabled.swap(false, Ordering::AcqRel) }
    }

    fn restore(&self, state: InterruptState) {
        if state.was_enabled {
            self.enabled.store(true, Ordering::Release);
        }
    }

    fn are_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for InterruptFlag {
    fn default() -> Self {
        Self::new()
    }
}
