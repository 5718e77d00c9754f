//! Device fixture: a transfer session wired to an in-memory channel, with a
//! terminal subscriber registered first, the way a terminal page sets it up.
//!
//! # Example
//!
//! ```no_run
//! use termferry_integration_tests::fixtures::DeviceFixture;
//!
//! #[tokio::test]
//! async fn test_download() {
//!     let mut device = DeviceFixture::new();
//!     let session = device.session.clone();
//!     let task = tokio::spawn(async move { session.download("/etc/hosts").await });
//!
//!     let request = device.next_sent().await;
//!     // ... reply with download_complete ...
//! }
//! ```

use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use termferry_core::{
    Channel, ChannelError, Disposition, Inbound, MemoryTransport, Subscriber, Subscription,
    TransferConfig, TransferSession,
    transfer::{RecordingNotifier, RecordingProgress},
};
use termferry_files::{FileSelection, MemorySink, checksum_hex};
use tokio::sync::mpsc::UnboundedReceiver;

/// How long [`DeviceFixture::next_sent`] waits before failing the test
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// What the terminal subscriber has seen
#[derive(Debug, Default)]
pub struct TerminalRecord {
    /// Raw text frames, in arrival order
    pub lines: Vec<String>,
    /// Transport errors
    pub errors: Vec<ChannelError>,
    /// Whether the close notification arrived
    pub closed: bool,
}

/// Terminal stand-in: claims everything it is offered
struct TerminalRecorder(Arc<Mutex<TerminalRecord>>);

impl Subscriber for TerminalRecorder {
    fn on_message(&mut self, inbound: &Inbound) -> Disposition {
        self.0.lock().unwrap().lines.push(inbound.text.clone());
        Disposition::Handled
    }

    fn on_error(&mut self, error: &ChannelError) {
        self.0.lock().unwrap().errors.push(error.clone());
    }

    fn on_close(&mut self) {
        self.0.lock().unwrap().closed = true;
    }
}

/// Session, channel, and recorders for one simulated device
pub struct DeviceFixture {
    pub channel: Arc<Channel>,
    pub session: Arc<TransferSession>,
    pub sink: Arc<MemorySink>,
    pub notifier: Arc<RecordingNotifier>,
    pub progress: Arc<RecordingProgress>,
    terminal: Arc<Mutex<TerminalRecord>>,
    sent: UnboundedReceiver<String>,
    _terminal_guard: Subscription,
}

impl DeviceFixture {
    /// Default limits with a short retry backoff and no progress hide delay
    pub fn new() -> Self {
        Self::with_config(TransferConfig {
            retry_backoff_ms: 10,
            progress_hide_delay_ms: 0,
            ..TransferConfig::default()
        })
    }

    /// Fixture with an explicit transfer configuration
    pub fn with_config(config: TransferConfig) -> Self {
        let (transport, sent) = MemoryTransport::pair();
        let channel = Channel::new(transport);

        let terminal = Arc::new(Mutex::new(TerminalRecord::default()));
        let terminal_guard = channel.subscribe(TerminalRecorder(terminal.clone()));

        let sink = Arc::new(MemorySink::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let progress = Arc::new(RecordingProgress::new());
        let session = TransferSession::new(channel.clone(), sink.clone())
            .with_config(&config)
            .with_notifier(notifier.clone())
            .with_progress(progress.clone());

        Self {
            channel,
            session: Arc::new(session),
            sink,
            notifier,
            progress,
            terminal,
            sent,
            _terminal_guard: terminal_guard,
        }
    }

    /// Next frame the client sent, parsed as JSON
    ///
    /// # Panics
    ///
    /// Panics if nothing is sent within a few seconds or the frame is not JSON.
    pub async fn next_sent(&mut self) -> Value {
        let text = tokio::time::timeout(SEND_TIMEOUT, self.sent.recv())
            .await
            .expect("timed out waiting for a client message")
            .expect("transport dropped");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Whether nothing further has been sent
    pub fn nothing_sent(&mut self) -> bool {
        self.sent.try_recv().is_err()
    }

    /// Deliver a server message
    pub fn reply(&self, message: Value) -> Disposition {
        self.channel.deliver(message.to_string())
    }

    /// Deliver a `download_complete` for `content`, with its correct checksum
    pub fn complete_download(&self, filename: &str, content: &str, file_type: &str) -> Disposition {
        self.reply(serde_json::json!({
            "type": "download_complete",
            "filename": filename,
            "content": content,
            "file_type": file_type,
            "file_size": content.len(),
            "checksum": checksum_hex(content.as_bytes()),
        }))
    }

    /// Snapshot of terminal activity
    pub fn terminal<R>(&self, f: impl FnOnce(&TerminalRecord) -> R) -> R {
        f(&self.terminal.lock().unwrap())
    }
}

impl Default for DeviceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to `dir/name` and select it as `text/plain`
pub fn text_file(dir: &Path, name: &str, content: &str) -> FileSelection {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    FileSelection {
        name: name.to_string(),
        size: content.len() as u64,
        content_type: "text/plain".to_string(),
        path,
    }
}
