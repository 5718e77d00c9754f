//! Upload and download sessions over the shared channel.

mod intercept;
pub mod progress;
pub mod session;

pub use progress::{
    LogNotifier, NoProgress, Notifier, ProgressEvent, ProgressIndicator, RecordingNotifier,
    RecordingProgress, hide_after,
};
pub use session::{DownloadOutcome, SessionState, TransferSession, UploadOutcome};
