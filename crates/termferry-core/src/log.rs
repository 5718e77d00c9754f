//! Transfer log.
//!
//! Append-only record of transfer activity, bounded to a fixed number of
//! entries with oldest-first eviction. Appends are mirrored to `tracing`.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of retained entries
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Local file to remote path
    Upload,
    /// Remote path to local sink
    Download,
}

impl Direction {
    /// Wire and log name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Status recorded by a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// Request accepted for processing
    Pending,
    /// Transfer finished successfully
    Success,
    /// An attempt or the whole transfer failed
    Failed,
    /// A failed upload is being retried
    Retrying,
}

impl LogStatus {
    /// Whether this status ends a transfer's entry sequence
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Log name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One transfer log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Unix time in milliseconds
    pub timestamp_ms: u64,
    /// Transfer direction
    #[serde(rename = "type")]
    pub direction: Direction,
    /// File name
    pub filename: String,
    /// Entry status
    pub status: LogStatus,
    /// Free-form detail, empty when there is none
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        direction: Direction,
        filename: impl Into<String>,
        status: LogStatus,
        message: impl Into<String>,
    ) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            timestamp_ms,
            direction,
            filename: filename.into(),
            status,
            message: message.into(),
        }
    }

    /// Single-line rendering for a log panel
    #[must_use]
    pub fn render_line(&self) -> String {
        let mut line = format!(
            "[{}] {:<8} {:<9} {}",
            self.timestamp_ms, self.direction, self.status, self.filename
        );
        if !self.message.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.message);
        }
        line
    }
}

/// Bounded, internally synchronized transfer log
#[derive(Debug)]
pub struct TransferLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl Default for TransferLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl TransferLog {
    /// Create a log retaining at most `capacity` entries (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn entries_mut(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&self, entry: LogEntry) {
        match entry.status {
            LogStatus::Failed => tracing::warn!(
                direction = %entry.direction,
                file = %entry.filename,
                "{} failed: {}",
                entry.direction,
                entry.message
            ),
            status => tracing::info!(
                direction = %entry.direction,
                file = %entry.filename,
                "{} {}: {}",
                entry.direction,
                status,
                entry.message
            ),
        }

        let mut entries = self.entries_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Convenience wrapper around [`TransferLog::push`]
    pub fn record(
        &self,
        direction: Direction,
        filename: &str,
        status: LogStatus,
        message: impl Into<String>,
    ) {
        self.push(LogEntry::new(direction, filename, status, message));
    }

    /// Snapshot of all entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries_mut().iter().cloned().collect()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<LogEntry> {
        self.entries_mut().back().cloned()
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries_mut().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries_mut().is_empty()
    }

    /// Maximum number of retained entries
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries_mut().clear();
    }
}
