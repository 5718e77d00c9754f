//! Progress and alert hooks for the user interface.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Progress indicator for the active transfer
pub trait ProgressIndicator: Send + Sync {
    /// Make the indicator visible
    fn show(&self);

    /// Set progress percentage (0.0 to 100.0)
    fn set(&self, percent: f64);

    /// Hide the indicator
    fn hide(&self);
}

/// Indicator that displays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressIndicator for NoProgress {
    fn show(&self) {}
    fn set(&self, _percent: f64) {}
    fn hide(&self) {}
}

/// Hide `progress` after `delay` on a spawned task.
///
/// Returns the task handle so a later transfer can abort a pending hide;
/// `None` when the indicator was hidden immediately.
pub fn hide_after(progress: Arc<dyn ProgressIndicator>, delay: Duration) -> Option<JoinHandle<()>> {
    if delay.is_zero() {
        progress.hide();
        return None;
    }
    Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        progress.hide();
    }))
}

/// User-visible alerts
pub trait Notifier: Send + Sync {
    /// Show an alert
    fn alert(&self, message: &str);
}

/// Routes alerts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!("alert: {}", message);
    }
}

/// Progress event captured by [`RecordingProgress`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// `show()`
    Show,
    /// `set(percent)`
    Set(f64),
    /// `hide()`
    Hide,
}

/// Records every progress call, for embedders that poll and for tests
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the last visibility change hid the indicator
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.events()
            .iter()
            .rev()
            .find(|e| !matches!(e, ProgressEvent::Set(_)))
            .is_none_or(|e| *e == ProgressEvent::Hide)
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ProgressIndicator for RecordingProgress {
    fn show(&self) {
        self.push(ProgressEvent::Show);
    }

    fn set(&self, percent: f64) {
        self.push(ProgressEvent::Set(percent));
    }

    fn hide(&self) {
        self.push(ProgressEvent::Hide);
    }
}

/// Collects alerts
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts so far
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_progress_visibility() {
        let progress = RecordingProgress::new();
        assert!(progress.is_hidden());

        progress.show();
        progress.set(50.0);
        assert!(!progress.is_hidden());

        progress.hide();
        assert!(progress.is_hidden());
        assert_eq!(
            progress.events(),
            vec![
                ProgressEvent::Show,
                ProgressEvent::Set(50.0),
                ProgressEvent::Hide
            ]
        );
    }

    #[tokio::test]
    async fn test_hide_after_delay() {
        let progress = Arc::new(RecordingProgress::new());
        progress.show();

        let pending = hide_after(progress.clone(), Duration::from_millis(20));
        assert!(pending.is_some());
        assert!(!progress.is_hidden());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(progress.is_hidden());
    }

    #[tokio::test]
    async fn test_aborted_hide_leaves_indicator_visible() {
        let progress = Arc::new(RecordingProgress::new());
        progress.show();

        let pending = hide_after(progress.clone(), Duration::from_millis(20)).unwrap();
        pending.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!progress.is_hidden());
    }

    #[test]
    fn test_hide_after_zero_is_immediate() {
        let progress = Arc::new(RecordingProgress::new());
        progress.show();
        assert!(hide_after(progress.clone(), Duration::ZERO).is_none());
        assert!(progress.is_hidden());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.alert("unsupported file type");
        assert_eq!(notifier.alerts(), vec!["unsupported file type"]);
    }
}
