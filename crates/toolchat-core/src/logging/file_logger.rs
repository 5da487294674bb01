//! File-based logger
//!
//! Useful for the interactive CLI, where stderr output would interleave with
//! the conversation.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// A logger that appends timestamped lines to a file
pub struct FileLogger {
    path: PathBuf,
    file: Mutex<File>,
    min_level: LogLevel,
}

impl FileLogger {
    /// Open (or create) `path` for appending
    pub fn open(path: impl AsRef<Path>, min_level: LogLevel) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            min_level,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// UTC wall-clock time of day, `HH:MM:SS.mmm`
fn clock_time() -> String {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            format!(
                "{:02}:{:02}:{:02}.{:03}",
                (secs % 86_400) / 3600,
                (secs % 3600) / 60,
                secs % 60,
                d.subsec_millis()
            )
        }
        Err(_) => "??:??:??.???".to_string(),
    }
}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger")
            .field("path", &self.path)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl Logger for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let mut file = self.file.lock();
        // a failed write is dropped rather than surfaced to the caller
        let _ = writeln!(file, "[{}] [{}] {}", clock_time(), level, message);
        let _ = file.flush();
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_logger_respects_min_level() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("chat.log");
        let logger = FileLogger::open(&path, LogLevel::Info).unwrap();

        logger.debug("hidden");
        logger.info("connected");
        logger.error("boom");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden"));
        assert!(content.contains("[INFO ] connected"));
        assert!(content.contains("[ERROR] boom"));
    }
}
