//! # termferry Core
//!
//! File transfer over a shared terminal message channel.
//!
//! This crate provides:
//! - Wire messages for connect, upload, and download control traffic
//! - Channel dispatch with ordered subscribers (interception with fallthrough)
//! - Upload/download sessions with SHA-256 checks and bounded retries
//! - A bounded transfer log
//! - Error types and handling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     TransferSession                              │
//! │   (one upload or download at a time, retries, integrity)        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                        Channel                                   │
//! │   (subscribers newest-first: interceptor ─► terminal echo)      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                       Transport                                  │
//! │   (text frames: WebSocket bridge, stdio, in-memory)             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod limits;
pub mod log;
pub mod message;
pub mod retry;
pub mod transfer;

pub use channel::{
    CLOSED_BANNER, CONNECTED_BANNER, Channel, Disposition, MemoryTransport, Subscriber,
    Subscription, SubscriptionId, TerminalEcho, Transport,
};
pub use config::TransferConfig;
pub use error::{ChannelError, ConfigError, Rejection, TransferError};
pub use limits::{DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_FILE_SIZE, TransferLimits};
pub use log::{DEFAULT_LOG_CAPACITY, Direction, LogEntry, LogStatus, TransferLog};
pub use message::{ClientMessage, Inbound, MessageKind, ServerMessage, remote_basename};
pub use retry::RetryPolicy;
pub use transfer::{
    DownloadOutcome, LogNotifier, NoProgress, Notifier, ProgressIndicator, SessionState,
    TransferSession, UploadOutcome,
};
