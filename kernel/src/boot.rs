//! Séquence de boot
//!
//! Builds the machine and the single alarm, then wires the alarm in as the
//! timer's interrupt handler. The resulting `Kernel` is owned by the caller
//! and passed by reference; nothing here lives in a static.

use alloc::format;
use alloc::sync::Arc;

use crate::config::AlarmConfig;
use crate::logger;
use crate::machine::SimMachine;
use crate::scheduler::{SimThread, ThreadId};
use crate::time::{AlarmResult, AlarmService, AlarmStatsSnapshot, Tick};

/// Alarm bound to the simulated machine
pub type SimAlarm = AlarmService<Arc<SimMachine>>;

/// A booted kernel
pub struct Kernel {
    machine: Arc<SimMachine>,
    alarm: Arc<SimAlarm>,
}

/// Initialise the kernel
pub fn kernel_init(config: AlarmConfig) -> AlarmResult<Kernel> {
    config.validate()?;
    logger::init(config.log_level);
    logger::early_print("[BOOT] Alarm kernel starting");

    logger::info("[BOOT] Machine...");
    let machine = Arc::new(SimMachine::new(&config));

    logger::info("[BOOT] Alarm...");
    let alarm = Arc::new(AlarmService::new(machine.clone(), &config));
    machine.timer().set_interrupt_handler(alarm.clone());

    logger::info(&format!(
        "[BOOT] Timer armed: interrupt every {} ticks",
        config.timer_interval
    ));
    Ok(Kernel { machine, alarm })
}

impl Kernel {
    pub fn machine(&self) -> &SimMachine {
        &self.machine
    }

    pub fn alarm(&self) -> &SimAlarm {
        &self.alarm
    }

    /// Sleep the running thread for at least `delay` ticks
    pub fn wait_until(&self, delay: i64) {
        self.alarm.wait_until(delay)
    }

    pub fn spawn(&self, name: &str) -> SimThread {
        self.machine.spawn(name)
    }

    pub fn current_thread_id(&self) -> ThreadId {
        self.machine.current_thread_id()
    }

    /// Let simulated time pass; timer interrupts fire along the way
    pub fn advance(&self, ticks: Tick) -> usize {
        self.machine.advance(ticks)
    }

    pub fn stats(&self) -> AlarmStatsSnapshot {
        self.alarm.stats()
    }

    /// Detach the alarm from the timer (breaks the machine <-> alarm cycle)
    pub fn shutdown(self) {
        self.machine.timer().clear_interrupt_handler();
        logger::info("[BOOT] Timer handler removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ThreadState, MAIN_THREAD};
    use crate::time::AlarmError;

    #[test]
    fn test_init_wires_timer() {
        let kernel = kernel_init(AlarmConfig::new().with_timer_interval(50)).unwrap();
        assert!(kernel.machine().timer().has_handler());

        kernel.wait_until(120);
        assert_eq!(kernel.machine().thread_state(MAIN_THREAD), Some(ThreadState::Blocked));

        // Interrupts at 50 and 100 are too early, 150 wakes
        assert_eq!(kernel.advance(149), 2);
        assert_eq!(kernel.machine().thread_state(MAIN_THREAD), Some(ThreadState::Blocked));
        assert_eq!(kernel.advance(1), 1);
        assert_eq!(kernel.current_thread_id(), MAIN_THREAD);
        assert_eq!(kernel.stats().interrupts, 3);
        kernel.shutdown();
    }

    #[test]
    fn test_init_rejects_bad_config() {
        let result = kernel_init(AlarmConfig::new().with_timer_interval(0));
        assert!(matches!(result, Err(AlarmError::InvalidConfig { .. })));
    }
}
