//! Alarm configuration
//!
//! Central constants and the runtime configuration handed to `kernel_init`.

use crate::time::{AlarmError, AlarmResult, Tick};
use log::LevelFilter;

/// Ticks between two periodic timer interrupts
pub const DEFAULT_TIMER_INTERVAL: Tick = 500;

/// Alarm / timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmConfig {
    /// Period of the hardware timer, in ticks
    pub timer_interval: Tick,
    /// Only ready threads that are still `Blocked` when their bucket drains
    pub skip_non_blocked: bool,
    /// Maximum level accepted by the kernel logger
    pub log_level: LevelFilter,
}

impl AlarmConfig {
    pub const fn new() -> Self {
        Self {
            timer_interval: DEFAULT_TIMER_INTERVAL,
            skip_non_blocked: true,
            log_level: LevelFilter::Info,
        }
    }

    pub const fn with_timer_interval(mut self, ticks: Tick) -> Self {
        self.timer_interval = ticks;
        self
    }

    pub const fn with_skip_non_blocked(mut self, skip: bool) -> Self {
        self.skip_non_blocked = skip;
        self
    }

    pub const fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Reject configurations the timer cannot run with
    pub fn validate(&self) -> AlarmResult<()> {
        if self.timer_interval == 0 {
            return Err(AlarmError::InvalidConfig {
                reason: "timer_interval must be at least one tick",
            });
        }
        Ok(())
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AlarmConfig::default();
        assert_eq!(cfg.timer_interval, 500);
        assert!(cfg.skip_non_blocked);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cfg = AlarmConfig::new().with_timer_interval(0);
        assert!(matches!(cfg.validate(), Err(AlarmError::InvalidConfig { .. })));
    }
}
