//! Logger that discards everything

use super::traits::{LogLevel, Logger};

/// Discards every message; `enabled` is always false so the `log_*!`
/// macros never format anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}

    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}
