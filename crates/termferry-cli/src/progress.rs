//! Transfer progress display with progress bars, and styled alerts.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use termferry_core::{Notifier, ProgressIndicator};

/// Percentage progress bar on stderr
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Create a hidden bar labelled with `filename`
    #[must_use]
    pub fn new(filename: &str) -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::hidden());

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        bar.set_message(format!("Transferring: {filename}"));

        Self { bar }
    }
}

impl ProgressIndicator for BarProgress {
    fn show(&self) {
        self.bar.reset();
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn set(&self, percent: f64) {
        self.bar.set_position(percent_position(percent));
    }

    fn hide(&self) {
        self.bar.finish_and_clear();
    }
}

/// Bar position for a percentage; out-of-range values are clamped
fn percent_position(percent: f64) -> u64 {
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, 100.0).round() as u64
}

/// Prints alerts to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        let line = format!("{} {}", style("alert:").red().bold(), message);
        if Term::stderr().write_line(&line).is_err() {
            tracing::warn!("alert: {}", message);
        }
    }
}

/// Format bytes in human-readable format (`1536` -> `1.50 KB`)
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}
