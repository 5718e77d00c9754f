//! Transfer configuration

use crate::error::ConfigError;
use crate::limits::{DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_FILE_SIZE, TransferLimits};
use crate::log::DEFAULT_LOG_CAPACITY;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for the size ceiling (messages carry the whole file)
const MAX_CONFIGURABLE_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Transfer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Accepted content types, both directions
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,

    /// Size ceiling in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Upload retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay before each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Delay before the progress indicator is hidden after completion
    #[serde(default = "default_progress_hide_delay_ms")]
    pub progress_hide_delay_ms: u64,

    /// Retained transfer log entries
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_allowed_types() -> Vec<String> {
    DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_progress_hide_delay_ms() -> u64 {
    2000
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            allowed_types: default_allowed_types(),
            max_file_size: default_max_file_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            progress_hide_delay_ms: default_progress_hide_delay_ms(),
            log_capacity: default_log_capacity(),
        }
    }
}

impl TransferConfig {
    /// Content-type and size limits
    #[must_use]
    pub fn limits(&self) -> TransferLimits {
        TransferLimits::new(&self.allowed_types, self.max_file_size)
    }

    /// Upload retry policy
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }

    /// Progress hide delay
    #[must_use]
    pub fn progress_hide_delay(&self) -> Duration {
        Duration::from_millis(self.progress_hide_delay_ms)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_types.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_types",
                reason: "at least one content type is required".into(),
            });
        }
        if let Some(bad) = self.allowed_types.iter().find(|t| !t.contains('/')) {
            return Err(ConfigError::Invalid {
                field: "allowed_types",
                reason: format!("{bad:?} is not a MIME type"),
            });
        }
        if self.max_file_size == 0 || self.max_file_size > MAX_CONFIGURABLE_FILE_SIZE {
            return Err(ConfigError::Invalid {
                field: "max_file_size",
                reason: format!("must be between 1 and {MAX_CONFIGURABLE_FILE_SIZE} bytes"),
            });
        }
        if self.max_retries > 10 {
            return Err(ConfigError::Invalid {
                field: "max_retries",
                reason: "must be at most 10".into(),
            });
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "log_capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
