//! Logging capability injected into the extraction pipeline.
//!
//! The pipeline never reaches for a global logger. It is handed a `Logger`
//! at construction; `LogFacade` forwards to the `log` crate and
//! `MemoryLogger` keeps entries in memory for assertions.

use std::sync::{Arc, Mutex};

use log::Level;

/// Sink for stage-tagged log messages.
pub trait Logger: Send + Sync {
    /// Record one message.
    fn log(&self, level: Level, stage: &str, message: &str);

    /// Record a debug message.
    fn debug(&self, stage: &str, message: &str) {
        self.log(Level::Debug, stage, message);
    }

    /// Record an informational message.
    fn info(&self, stage: &str, message: &str) {
        self.log(Level::Info, stage, message);
    }

    /// Record a warning.
    fn warn(&self, stage: &str, message: &str) {
        self.log(Level::Warn, stage, message);
    }

    /// Record an error.
    fn error(&self, stage: &str, message: &str) {
        self.log(Level::Error, stage, message);
    }
}

/// Forwards to the `log` facade; configure output with `env_logger` or any
/// other `log` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, stage: &str, message: &str) {
        log::log!(target: "markscrape", level, "[{stage}] {message}");
    }
}

/// One recorded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity.
    pub level: Level,
    /// Stage that logged.
    pub stage: String,
    /// Message text.
    pub message: String,
}

/// Keeps every entry in memory. Cloning shares the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLogger {
    /// Empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Whether any entry's message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, stage: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                stage: stage.to_string(),
                message: message.to_string(),
            });
        }
    }
}
