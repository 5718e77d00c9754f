//! Transfer session: one upload or download at a time over the shared channel.
//!
//! # Upload flow
//!
//! ```text
//! pending ─► check path/type/size ─► read text (progress) ─► sha256
//!    │                                                        │
//!    └─ rejection: alert, stop                                ▼
//!                          ┌──────────── send upload ◄── retry after backoff
//!                          ▼                                  ▲
//!                   upload_result ── success=false, retries left ┘
//!                          │
//!                  success=true ─► success
//!                  retries exhausted ─► failed
//! ```
//!
//! The content and checksum from the single local read are reused for every
//! retry, so a retried upload always carries exactly the bytes that were
//! hashed.

use crate::channel::Channel;
use crate::config::TransferConfig;
use crate::error::{Rejection, Result, TransferError};
use crate::limits::TransferLimits;
use crate::log::{Direction, LogStatus, TransferLog};
use crate::message::{ClientMessage, MessageKind, ServerMessage, remote_basename};
use crate::retry::RetryPolicy;
use crate::transfer::intercept::{Interceptor, TransferEvent, next_event};
use crate::transfer::progress::{LogNotifier, NoProgress, Notifier, ProgressIndicator, hide_after};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use termferry_files::{DownloadSink, FileSelection, checksum_hex, read_text_with_progress, verify_checksum};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const UPLOAD_KINDS: &[MessageKind] = &[MessageKind::UploadResult];
const DOWNLOAD_KINDS: &[MessageKind] = &[MessageKind::DownloadProgress, MessageKind::DownloadComplete];

/// Whether a transfer currently owns the channel interception
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transfer in flight
    Idle,
    /// A transfer in the given direction is in flight
    Active(Direction),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active(direction) => write!(f, "active ({direction})"),
        }
    }
}

/// Successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Uploaded file name
    pub filename: String,
    /// Destination path
    pub remote_path: String,
    /// Checksum sent with every attempt
    pub checksum: String,
    /// Number of upload messages sent
    pub attempts: u32,
}

/// Successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// File name reported by the server
    pub filename: String,
    /// Where the sink stored the content
    pub location: String,
    /// Content length in bytes
    pub size: u64,
    /// Verified checksum
    pub checksum: String,
}

/// Returns the session to idle when the transfer ends, however it ends
struct ActiveGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SessionState::Idle;
    }
}

/// Drives uploads and downloads over a shared [`Channel`]
pub struct TransferSession {
    channel: Arc<Channel>,
    sink: Arc<dyn DownloadSink>,
    log: Arc<TransferLog>,
    limits: TransferLimits,
    retry: RetryPolicy,
    hide_delay: Duration,
    progress: Arc<dyn ProgressIndicator>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
    /// Delayed hide left behind by the previous transfer
    pending_hide: Mutex<Option<JoinHandle<()>>>,
}

impl TransferSession {
    /// Create a session with default limits, retry policy, and a fresh log
    pub fn new(channel: Arc<Channel>, sink: Arc<dyn DownloadSink>) -> Self {
        let config = TransferConfig::default();
        Self {
            channel,
            sink,
            log: Arc::new(TransferLog::new(config.log_capacity)),
            limits: config.limits(),
            retry: config.retry_policy(),
            hide_delay: config.progress_hide_delay(),
            progress: Arc::new(NoProgress),
            notifier: Arc::new(LogNotifier),
            state: Mutex::new(SessionState::Idle),
            pending_hide: Mutex::new(None),
        }
    }

    /// Apply limits, retry policy, hide delay, and log capacity from `config`.
    ///
    /// Replaces the log; call before [`TransferSession::with_log`] to share one.
    #[must_use]
    pub fn with_config(mut self, config: &TransferConfig) -> Self {
        self.limits = config.limits();
        self.retry = config.retry_policy();
        self.hide_delay = config.progress_hide_delay();
        self.log = Arc::new(TransferLog::new(config.log_capacity));
        self
    }

    /// Use a shared transfer log
    #[must_use]
    pub fn with_log(mut self, log: Arc<TransferLog>) -> Self {
        self.log = log;
        self
    }

    /// Use a progress indicator
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressIndicator>) -> Self {
        self.progress = progress;
        self
    }

    /// Use an alert notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Transfer log
    #[must_use]
    pub fn log(&self) -> &Arc<TransferLog> {
        &self.log
    }

    /// Channel this session transfers over
    #[must_use]
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show progress at 0 for a new transfer, cancelling any delayed hide
    /// still pending from the previous one
    fn show_progress(&self) {
        self.cancel_pending_hide();
        self.progress.show();
        self.progress.set(0.0);
    }

    /// Complete the progress and hide it after the configured delay
    fn finish_progress(&self) {
        self.progress.set(100.0);
        let handle = hide_after(self.progress.clone(), self.hide_delay);
        let previous = std::mem::replace(
            &mut *self.pending_hide.lock().unwrap_or_else(PoisonError::into_inner),
            handle,
        );
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_pending_hide(&self) {
        let pending = self
            .pending_hide
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }

    /// Claim the session for one transfer, or report it busy
    fn begin(&self, direction: Direction) -> Result<ActiveGuard<'_>> {
        let mut state = self.lock_state();
        if let SessionState::Active(current) = *state {
            drop(state);
            tracing::debug!("rejecting {} while {} is active", direction, current);
            let err = TransferError::Busy;
            self.notifier.alert(&err.to_string());
            return Err(err);
        }
        *state = SessionState::Active(direction);
        Ok(ActiveGuard { state: &self.state })
    }

    /// Log a terminal failure, hide progress, optionally alert
    fn fail(&self, direction: Direction, filename: &str, err: TransferError, alert: bool) -> TransferError {
        self.cancel_pending_hide();
        self.progress.hide();
        self.log
            .record(direction, filename, LogStatus::Failed, err.to_string());
        if alert {
            self.notifier.alert(&err.to_string());
        }
        err
    }

    fn reject(&self, rejection: Rejection) -> TransferError {
        self.notifier.alert(&rejection.to_string());
        TransferError::Rejected(rejection)
    }

    fn check_upload(&self, selection: &FileSelection, remote_path: &str) -> std::result::Result<(), Rejection> {
        if remote_path.is_empty() {
            return Err(Rejection::EmptyPath);
        }
        self.limits.check(&selection.content_type, selection.size)
    }

    /// Upload one file to `remote_path` (surrounding whitespace is trimmed)
    ///
    /// # Errors
    ///
    /// - [`TransferError::Busy`] if another transfer is active (nothing logged)
    /// - [`TransferError::Rejected`] for an empty path, disallowed type, or
    ///   oversized file (only the `pending` entry is logged, nothing is sent)
    /// - [`TransferError::Read`] if the local file cannot be read
    /// - [`TransferError::RetriesExhausted`] once the server has failed
    ///   every attempt
    /// - [`TransferError::Transport`] / [`TransferError::ChannelClosed`] if the
    ///   connection fails while waiting for a result
    pub async fn upload(&self, selection: &FileSelection, remote_path: &str) -> Result<UploadOutcome> {
        let remote_path = remote_path.trim();
        let _active = self.begin(Direction::Upload)?;
        let filename = selection.name.as_str();

        self.log
            .record(Direction::Upload, filename, LogStatus::Pending, "");

        if let Err(rejection) = self.check_upload(selection, remote_path) {
            tracing::debug!("upload of {} rejected: {}", filename, rejection);
            return Err(self.reject(rejection));
        }

        self.show_progress();

        let progress = self.progress.clone();
        let content = read_text_with_progress(&selection.path, |loaded, total| {
            if total > 0 {
                progress.set(loaded as f64 / total as f64 * 100.0);
            }
        })
        .await
        .map_err(|err| self.fail(Direction::Upload, filename, TransferError::Read(err), true))?;

        let checksum = checksum_hex(content.as_bytes());
        tracing::debug!(
            "uploading {} ({} bytes) to {}, sha256={}",
            filename,
            selection.size,
            remote_path,
            checksum
        );

        let request = ClientMessage::Upload {
            filename: filename.to_string(),
            remote_path: remote_path.to_string(),
            content,
            size: selection.size,
            checksum: checksum.clone(),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _interception = self.channel.subscribe(Interceptor::new(UPLOAD_KINDS, tx));

        let mut retries = 0u32;
        loop {
            self.channel
                .send(&request)
                .map_err(|err| self.fail(Direction::Upload, filename, err.into(), true))?;
            self.finish_progress();

            let (success, message) = loop {
                match next_event(&mut rx).await {
                    TransferEvent::Message(ServerMessage::UploadResult { success, message }) => {
                        break (success, message);
                    }
                    TransferEvent::Message(other) => {
                        tracing::debug!("ignoring {} during upload", other.kind());
                    }
                    TransferEvent::Error(err) => {
                        let err = TransferError::Transport(err.to_string());
                        return Err(self.fail(Direction::Upload, filename, err, true));
                    }
                    TransferEvent::Closed => {
                        return Err(self.fail(Direction::Upload, filename, TransferError::ChannelClosed, true));
                    }
                }
            };

            if success {
                self.log
                    .record(Direction::Upload, filename, LogStatus::Success, "file uploaded");
                return Ok(UploadOutcome {
                    filename: filename.to_string(),
                    remote_path: remote_path.to_string(),
                    checksum,
                    attempts: retries + 1,
                });
            }

            let reason = message.unwrap_or_else(|| "upload failed".to_string());
            self.log
                .record(Direction::Upload, filename, LogStatus::Failed, reason.clone());

            if !self.retry.allows_retry(retries) {
                self.log.record(
                    Direction::Upload,
                    filename,
                    LogStatus::Failed,
                    "exceeded maximum retries",
                );
                return Err(TransferError::RetriesExhausted {
                    attempts: retries + 1,
                    last_message: reason,
                });
            }

            retries += 1;
            self.log.record(
                Direction::Upload,
                filename,
                LogStatus::Retrying,
                format!("retry {} of {}", retries, self.retry.max_retries),
            );
            tokio::time::sleep(self.retry.backoff).await;
        }
    }

    /// Download `remote_path` (surrounding whitespace is trimmed) into the
    /// configured sink
    ///
    /// # Errors
    ///
    /// - [`TransferError::Rejected`] for an empty path (nothing logged or sent),
    ///   or when the server reports a disallowed type or oversized file
    /// - [`TransferError::Busy`] if another transfer is active
    /// - [`TransferError::ChecksumMismatch`] if the content fails verification;
    ///   nothing is saved
    /// - [`TransferError::Save`] if the sink cannot store the content
    /// - [`TransferError::Transport`] / [`TransferError::ChannelClosed`] if the
    ///   connection fails before completion
    pub async fn download(&self, remote_path: &str) -> Result<DownloadOutcome> {
        let remote_path = remote_path.trim();
        if remote_path.is_empty() {
            return Err(self.reject(Rejection::EmptyPath));
        }

        let _active = self.begin(Direction::Download)?;
        let requested = remote_basename(remote_path);

        self.log
            .record(Direction::Download, requested, LogStatus::Pending, "");
        self.show_progress();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _interception = self.channel.subscribe(Interceptor::new(DOWNLOAD_KINDS, tx));

        self.channel
            .send(&ClientMessage::Download {
                filename: requested.to_string(),
                remote_path: remote_path.to_string(),
            })
            .map_err(|err| self.fail(Direction::Download, requested, err.into(), true))?;
        tracing::debug!("requested download of {}", remote_path);

        loop {
            match next_event(&mut rx).await {
                TransferEvent::Message(ServerMessage::DownloadProgress { progress }) => {
                    if progress.is_finite() {
                        self.progress.set(progress.clamp(0.0, 100.0));
                    }
                }
                TransferEvent::Message(ServerMessage::DownloadComplete {
                    filename,
                    content,
                    file_type,
                    file_size,
                    checksum,
                }) => {
                    return self
                        .complete_download(filename, content, file_type, file_size, checksum)
                        .await;
                }
                TransferEvent::Message(other) => {
                    tracing::debug!("ignoring {} during download", other.kind());
                }
                TransferEvent::Error(err) => {
                    let err = TransferError::Transport(err.to_string());
                    return Err(self.fail(Direction::Download, requested, err, true));
                }
                TransferEvent::Closed => {
                    return Err(self.fail(Direction::Download, requested, TransferError::ChannelClosed, true));
                }
            }
        }
    }

    async fn complete_download(
        &self,
        filename: String,
        content: String,
        file_type: String,
        file_size: u64,
        checksum: String,
    ) -> Result<DownloadOutcome> {
        if let Err(rejection) = self.limits.check(&file_type, file_size) {
            return Err(self.fail(Direction::Download, &filename, rejection.into(), true));
        }

        if !verify_checksum(content.as_bytes(), &checksum) {
            let err = TransferError::ChecksumMismatch {
                expected: checksum,
                actual: checksum_hex(content.as_bytes()),
            };
            return Err(self.fail(Direction::Download, &filename, err, true));
        }

        let location = self
            .sink
            .save(&filename, content.as_bytes(), &file_type)
            .await
            .map_err(|err| self.fail(Direction::Download, &filename, err.into(), true))?;

        self.log.record(
            Direction::Download,
            &filename,
            LogStatus::Success,
            "file downloaded",
        );
        self.finish_progress();

        Ok(DownloadOutcome {
            size: content.len() as u64,
            filename,
            location,
            checksum: checksum.to_ascii_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryTransport;
    use crate::transfer::progress::{ProgressEvent, RecordingNotifier, RecordingProgress};
    use std::io::Write;
    use termferry_files::MemorySink;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        session: Arc<TransferSession>,
        channel: Arc<Channel>,
        sent: UnboundedReceiver<String>,
        sink: Arc<MemorySink>,
        notifier: Arc<RecordingNotifier>,
        progress: Arc<RecordingProgress>,
    }

    fn harness() -> Harness {
        harness_with(&TransferConfig::default())
    }

    fn harness_with(config: &TransferConfig) -> Harness {
        let (transport, sent) = MemoryTransport::pair();
        let channel = Channel::new(transport);
        let sink = Arc::new(MemorySink::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let progress = Arc::new(RecordingProgress::new());
        let session = TransferSession::new(channel.clone(), sink.clone())
            .with_config(config)
            .with_notifier(notifier.clone())
            .with_progress(progress.clone())
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(5)));

        Harness {
            session: Arc::new(session),
            channel,
            sent,
            sink,
            notifier,
            progress,
        }
    }

    fn text_file(content: &str) -> (tempfile::NamedTempFile, FileSelection) {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let selection = FileSelection {
            name: "a.txt".into(),
            size: content.len() as u64,
            content_type: "text/plain".into(),
            path: file.path().to_path_buf(),
        };
        (file, selection)
    }

    fn statuses(log: &TransferLog) -> Vec<LogStatus> {
        log.entries().iter().map(|e| e.status).collect()
    }

    #[tokio::test]
    async fn test_upload_success_first_attempt() {
        let mut h = harness();
        let (_file, selection) = text_file("hello");

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.upload(&selection, "/tmp").await });

        let sent: serde_json::Value = serde_json::from_str(&h.sent.recv().await.unwrap()).unwrap();
        assert_eq!(sent["type"], "upload");
        assert_eq!(sent["content"], "hello");
        assert_eq!(
            sent["checksum"],
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(h.session.state(), SessionState::Active(Direction::Upload));

        h.channel
            .deliver(r#"{"type":"upload_result","success":true}"#);
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(h.session.state(), SessionState::Idle);
        assert_eq!(
            statuses(h.session.log()),
            vec![LogStatus::Pending, LogStatus::Success]
        );
        assert_eq!(h.channel.subscriber_count(), 0);
        assert!(h.progress.events().contains(&ProgressEvent::Set(100.0)));
    }

    #[tokio::test]
    async fn test_upload_trims_remote_path() {
        let mut h = harness();
        let (_file, selection) = text_file("hello");

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.upload(&selection, "  /tmp/a.txt \n").await });

        let sent: serde_json::Value = serde_json::from_str(&h.sent.recv().await.unwrap()).unwrap();
        assert_eq!(sent["remote_path"], "/tmp/a.txt");

        h.channel
            .deliver(r#"{"type":"upload_result","success":true}"#);
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.remote_path, "/tmp/a.txt");
    }

    #[tokio::test]
    async fn test_delayed_hide_does_not_hide_next_transfer() {
        let mut h = harness_with(&TransferConfig {
            progress_hide_delay_ms: 100,
            ..TransferConfig::default()
        });
        let (_file, selection) = text_file("hello");

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.upload(&selection, "/tmp").await });
        h.sent.recv().await.unwrap();
        h.channel
            .deliver(r#"{"type":"upload_result","success":true}"#);
        task.await.unwrap().unwrap();

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.download("/etc/hosts").await });
        h.sent.recv().await.unwrap();
        h.channel
            .deliver(r#"{"type":"download_progress","progress":30}"#);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.session.state(), SessionState::Active(Direction::Download));
        assert!(!h.progress.is_hidden());

        h.channel.close();
        assert!(task.await.unwrap().is_err());
        assert!(h.progress.is_hidden());
    }

    #[tokio::test]
    async fn test_upload_rejections_send_nothing() {
        let mut h = harness();
        let (_file, selection) = text_file("hello");

        let png = selection.clone().with_content_type("image/png");
        let err = h.session.upload(&png, "/tmp").await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::Rejected(Rejection::UnsupportedType(_))
        ));

        let mut big = selection.clone();
        big.size = 10 * 1024 * 1024 + 1;
        let err = h.session.upload(&big, "/tmp").await.unwrap_err();
        assert!(matches!(err, TransferError::Rejected(Rejection::TooLarge { .. })));

        let err = h.session.upload(&selection, "  ").await.unwrap_err();
        assert!(matches!(err, TransferError::Rejected(Rejection::EmptyPath)));

        assert!(h.sent.try_recv().is_err());
        assert_eq!(h.notifier.alerts().len(), 3);
        assert_eq!(statuses(h.session.log()), vec![LogStatus::Pending; 3]);
        assert_eq!(h.session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_upload_retries_then_gives_up() {
        let mut h = harness();
        let (_file, selection) = text_file("data");

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.upload(&selection, "/tmp/a.txt").await });

        let mut checksums = Vec::new();
        for _ in 0..4 {
            let sent: serde_json::Value = serde_json::from_str(&h.sent.recv().await.unwrap()).unwrap();
            checksums.push(sent["checksum"].as_str().unwrap().to_string());
            h.channel
                .deliver(r#"{"type":"upload_result","success":false,"message":"disk full"}"#);
        }

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            TransferError::RetriesExhausted { attempts: 4, ref last_message } if last_message == "disk full"
        ));
        assert!(h.sent.try_recv().is_err());
        assert!(checksums.windows(2).all(|w| w[0] == w[1]));

        let log = statuses(h.session.log());
        assert_eq!(log.iter().filter(|s| **s == LogStatus::Retrying).count(), 3);
        assert_eq!(log.last(), Some(&LogStatus::Failed));
        assert_eq!(
            h.session.log().last().unwrap().message,
            "exceeded maximum retries"
        );
    }

    #[tokio::test]
    async fn test_upload_fails_when_channel_closes() {
        let mut h = harness();
        let (_file, selection) = text_file("data");

        let session = h.session.clone();
        let task = tokio::spawn(async move { session.upload(&selection, "/tmp").await });

        h.sent.recv().await.unwrap();
        h.channel.close();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, TransferError::ChannelClosed));
        assert_eq!(statuses(h.session.log()).last(), Some(&LogStatus::Failed));
        assert!(h.progress.is_hidden());
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let h = harness();
        let dir = tempfile::tempdir().unwrap();
        let selection = FileSelection {
            name: "gone.txt".into(),
            size: 3,
            content_type: "text/plain".into(),
            path: dir.path().join("gone.txt"),
        };

        let err = h.session.upload(&selection, "/tmp").await.unwrap_err();
        assert!(matches!(err, TransferError::Read(_)));
        assert_eq!(
            statuses(h.session.log()),
            vec![LogStatus::Pending, LogStatus::Failed]
        );
        assert_eq!(h.notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_download_success() {
        let mut h = harness();
        let session = h.session.clone();
        let task = tokio::spawn(async move { session.download("/etc/motd.txt").await });

        let sent: serde_json::Value = serde_json::from_str(&h.sent.recv().await.unwrap()).unwrap();
        assert_eq!(sent["type"], "download");
        assert_eq!(sent["filename"], "motd.txt");
        assert_eq!(sent["remote_path"], "/etc/motd.txt");

        h.channel
            .deliver(r#"{"type":"download_progress","progress":40}"#);
        let complete = serde_json::json!({
            "type": "download_complete",
            "filename": "motd.txt",
            "content": "welcome",
            "file_type": "text/plain",
            "file_size": 7,
            "checksum": checksum_hex(b"welcome").to_uppercase(),
        });
        h.channel.deliver(complete.to_string());

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.filename, "motd.txt");
        assert_eq!(outcome.size, 7);
        assert_eq!(outcome.location, "memory:motd.txt");

        let saved = h.sink.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content, b"welcome");
        assert!(h.progress.events().contains(&ProgressEvent::Set(40.0)));
        assert_eq!(
            statuses(h.session.log()),
            vec![LogStatus::Pending, LogStatus::Success]
        );
    }

    #[tokio::test]
    async fn test_download_rejects_disallowed_type() {
        let mut h = harness();
        let session = h.session.clone();
        let task = tokio::spawn(async move { session.download("/srv/logo.png").await });

        h.sent.recv().await.unwrap();
        let complete = serde_json::json!({
            "type": "download_complete",
            "filename": "logo.png",
            "content": "xx",
            "file_type": "image/png",
            "file_size": 2,
            "checksum": checksum_hex(b"xx"),
        });
        h.channel.deliver(complete.to_string());

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            TransferError::Rejected(Rejection::UnsupportedType(_))
        ));
        assert!(h.sink.saved().is_empty());
        assert_eq!(h.notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_download_empty_path() {
        let mut h = harness();
        let err = h.session.download("").await.unwrap_err();
        assert!(matches!(err, TransferError::Rejected(Rejection::EmptyPath)));
        assert!(h.sent.try_recv().is_err());
        assert!(h.session.log().is_empty());
    }

    #[tokio::test]
    async fn test_second_transfer_is_busy() {
        let mut h = harness();
        let session = h.session.clone();
        let task = tokio::spawn(async move { session.download("/etc/hosts").await });
        h.sent.recv().await.unwrap();

        let err = h.session.download("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, TransferError::Busy));
        assert!(h.sent.try_recv().is_err());

        h.channel.close();
        assert!(task.await.unwrap().is_err());
        assert_eq!(h.session.state(), SessionState::Idle);
    }
}
