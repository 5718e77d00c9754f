//! Wire messages.
//!
//! Control messages are JSON objects tagged by a `type` field. Anything on
//! the channel that does not parse as a known server message is terminal
//! output and is passed through untouched.
//!
//! ```text
//! Client                               Server
//!   |-- upload {content, checksum} ---->|
//!   |<--------- upload_result {success} |
//!   |                                   |
//!   |-- download {remote_path} -------->|
//!   |<----- download_progress {progress}|
//!   |<---- download_complete {content} -|
//! ```

use serde::{Deserialize, Serialize};

/// Messages sent from the client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Session initiation, sent once when the channel opens
    Connect {
        /// `ssh` or `serial`
        protocol: String,
        /// Device host or serial port
        host: String,
        /// Device port
        port: u16,
        /// Login name
        username: String,
        /// Login password
        password: String,
        /// Device family (vendor CLI flavour)
        #[serde(rename = "deviceType")]
        device_type: String,
    },

    /// Upload one file
    Upload {
        /// File name
        filename: String,
        /// Destination path on the device
        remote_path: String,
        /// Full file content as text
        content: String,
        /// Declared size in bytes
        size: u64,
        /// Lowercase hex SHA-256 of `content`
        checksum: String,
    },

    /// Download one file
    Download {
        /// Base name of `remote_path`
        filename: String,
        /// Source path on the device
        remote_path: String,
    },
}

impl ClientMessage {
    /// Encode as a JSON text frame
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent from the server to the client that the transfer layer understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Outcome of one upload attempt
    UploadResult {
        /// Whether the server stored the file
        success: bool,
        /// Failure reason or status text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Download progress percentage
    DownloadProgress {
        /// 0..=100
        progress: f64,
    },

    /// Download payload
    DownloadComplete {
        /// File name
        filename: String,
        /// Full file content as text
        content: String,
        /// Content type
        file_type: String,
        /// Size in bytes
        file_size: u64,
        /// Hex SHA-256 of `content`
        checksum: String,
    },
}

/// Discriminant of a [`ServerMessage`], used to key interception
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `upload_result`
    UploadResult,
    /// `download_progress`
    DownloadProgress,
    /// `download_complete`
    DownloadComplete,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadResult => write!(f, "upload_result"),
            Self::DownloadProgress => write!(f, "download_progress"),
            Self::DownloadComplete => write!(f, "download_complete"),
        }
    }
}

impl ServerMessage {
    /// Kind of this message
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::UploadResult { .. } => MessageKind::UploadResult,
            Self::DownloadProgress { .. } => MessageKind::DownloadProgress,
            Self::DownloadComplete { .. } => MessageKind::DownloadComplete,
        }
    }
}

/// One inbound text frame, parsed once for every subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    /// Raw text exactly as received
    pub text: String,
    /// Parsed transfer message, if the text is one
    pub message: Option<ServerMessage>,
}

impl Inbound {
    /// Classify raw inbound text
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let message = if text.trim_start().starts_with('{') {
            serde_json::from_str(&text).ok()
        } else {
            None
        };
        Self { text, message }
    }

    /// Kind of the parsed message, if any
    #[must_use]
    pub fn kind(&self) -> Option<MessageKind> {
        self.message.as_ref().map(ServerMessage::kind)
    }
}

/// Base name of a remote path (text after the last `/`)
#[must_use]
pub fn remote_basename(remote_path: &str) -> &str {
    remote_path.rsplit('/').next().unwrap_or(remote_path)
}
