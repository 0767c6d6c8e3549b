//! Simple logger implementation for the kernel
//!
//! Formats records as `[LEVEL] message` into a fixed stack buffer and keeps
//! the most recent lines in memory.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use log::{Level, LevelFilter, Metadata, Record};
use spin::{Mutex, Once};

/// Number of lines kept in the in-memory history
pub const LOG_HISTORY: usize = 256;

/// Simple logger that writes to the history ring
struct KernelLogger {
    history: Mutex<VecDeque<String>>,
}

impl KernelLogger {
    const fn new() -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
        }
    }

    fn emit(&self, line: &str) {
        let mut history = self.history.lock();
        if history.len() == LOG_HISTORY {
            history.pop_front();
        }
        history.push_back(String::from(line));
    }
}

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // Format: [LEVEL] message
            let level_str = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARN ",
                Level::Info => "INFO ",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };

            use core::fmt::Write;
            let mut buf = [0u8; 512];
            let pos = {
                let mut writer = BufferWriter { buffer: &mut buf, pos: 0 };
                let _ = core::write!(&mut writer, "[{}] {}", level_str, record.args());
                writer.pos
            };
            self.emit(&String::from_utf8_lossy(&buf[..pos]));
        }
    }

    fn flush(&self) {}
}

/// Simple buffer writer for formatting without alloc
///
/// Output longer than the buffer is truncated silently.
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> core::fmt::Write for BufferWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

/// Global logger instance
static LOGGER: KernelLogger = KernelLogger::new();

/// Guards `log::set_logger`, which may only succeed once per process
static INSTALLED: Once<bool> = Once::new();

/// Initialize the logger with the given maximum level
///
/// Safe to call more than once: the backend is installed on the first call,
/// later calls only adjust the level. Returns false if another logger was
/// already registered with the `log` facade.
pub fn init(level: LevelFilter) -> bool {
    let installed = *INSTALLED.call_once(|| log::set_logger(&LOGGER).is_ok());
    if installed {
        log::set_max_level(level);
    }
    installed
}

/// Print directly (bypass level filtering, for boot banners)
pub fn early_print(s: &str) {
    LOGGER.emit(s);
}

/// Snapshot of the most recent log lines, oldest first
pub fn recent() -> Vec<String> {
    LOGGER.history.lock().iter().cloned().collect()
}

/// Log at DEBUG level
#[inline]
pub fn debug(msg: &str) {
    log::debug!("{}", msg);
}

/// Log at INFO level
#[inline]
pub fn info(msg: &str) {
    log::info!("{}", msg);
}

/// Log at WARN level
#[inline]
pub fn warn(msg: &str) {
    log::warn!("{}", msg);
}

/// Log at ERROR level
#[inline]
pub fn error(msg: &str) {
    log::error!("{}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_buffer_writer_truncates() {
        let mut buf = [0u8; 8];
        let mut writer = BufferWriter { buffer: &mut buf, pos: 0 };
        let _ = write!(&mut writer, "{}", "0123456789");
        assert_eq!(writer.pos, 8);
        assert_eq!(&buf, b"01234567");
    }

    #[test]
    fn test_init_is_idempotent() {
        // Other tests boot kernels concurrently, so only the outcome is checked
        assert!(init(LevelFilter::Info));
        assert!(init(LevelFilter::Info));
    }

    #[test]
    fn test_early_print_lands_in_history() {
        early_print("[BOOT] logger self-test");
        assert!(recent().iter().any(|l| l == "[BOOT] logger self-test"));
    }
}
