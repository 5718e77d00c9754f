//! Error types for termferry.

use thiserror::Error;

/// Channel-level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel has been closed
    #[error("channel closed")]
    Closed,

    /// A control message could not be encoded
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// The underlying transport reported an error
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Local precondition violations, detected before anything is sent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No remote path given
    #[error("no remote path given")]
    EmptyPath,

    /// Content type is not in the allow-set
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    /// File exceeds the size ceiling
    #[error("file size {size} exceeds the {limit} byte limit")]
    TooLarge {
        /// Declared size
        size: u64,
        /// Configured ceiling
        limit: u64,
    },
}

/// Transfer errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// Another transfer currently owns the channel interception
    #[error("another transfer is already in progress")]
    Busy,

    /// Request rejected before sending
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Local file could not be read
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),

    /// Server kept reporting failure until the retry ceiling was hit
    #[error("upload failed after {attempts} attempts: {last_message}")]
    RetriesExhausted {
        /// Number of upload messages sent
        attempts: u32,
        /// Last failure message from the server
        last_message: String,
    },

    /// Downloaded content does not match the server checksum
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Server-supplied checksum
        expected: String,
        /// Locally computed checksum
        actual: String,
    },

    /// Verified content could not be saved
    #[error("failed to save download: {0}")]
    Save(#[from] termferry_files::SinkError),

    /// Transport error while the transfer was active
    #[error("connection error: {0}")]
    Transport(String),

    /// Channel closed while the transfer was active
    #[error("connection closed during transfer")]
    ChannelClosed,

    /// Sending on the channel failed
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value is out of its accepted range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result alias for transfer operations
pub type Result<T> = std::result::Result<T, TransferError>;
