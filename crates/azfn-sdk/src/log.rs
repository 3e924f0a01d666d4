use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Per-stage log channel. Lines written here are what users see in the
/// deployment view; plugin internals should keep using `tracing`.
pub trait LogPersister: Send + Sync {
    fn info(&self, message: &str);

    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Collects stage logs in memory so the host can return them with the
/// stage result. Every line is also mirrored to `tracing`.
#[derive(Default)]
pub struct BufferedLogPersister {
    lines: Mutex<Vec<LogLine>>,
}

impl BufferedLogPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<LogLine> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, level: LogLevel, message: &str) {
        let line = LogLine {
            level,
            message: message.to_string(),
        };
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl LogPersister for BufferedLogPersister {
    fn info(&self, message: &str) {
        tracing::debug!("{message}");
        self.push(LogLevel::Info, message);
    }

    fn success(&self, message: &str) {
        tracing::debug!("{message}");
        self.push(LogLevel::Success, message);
    }

    fn error(&self, message: &str) {
        tracing::debug!(error = true, "{message}");
        self.push(LogLevel::Error, message);
    }
}
