//! Terminal progress reporting.
//!
//! The engine reports progress through the [`ProgressSink`] trait so that
//! library consumers and tests can run it silently while the CLI drives an
//! indicatif bar.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver for engine progress events.
///
/// Implementations must be cheap: `advance` is called from hot loops.
pub trait ProgressSink: Sync {
    /// A new stage started with the given number of steps.
    fn stage(&self, label: &str, total: u64);

    /// The current stage advanced by `n` steps.
    fn advance(&self, n: u64);

    /// The current stage completed.
    fn finish(&self);
}

/// Sink that discards all events. Used by tests and library consumers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&self, _label: &str, _total: u64) {}
    fn advance(&self, _n: u64) {}
    fn finish(&self) {}
}

/// Sink that renders an indicatif bar per stage.
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    /// Create a terminal progress renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn stage(&self, label: &str, total: u64) {
        let bar = ProgressBar::new(total);
        bar.set_style(Self::style());
        bar.set_message(label.to_string());
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(old) = slot.take() {
                old.finish_and_clear();
            }
            *slot = Some(bar);
        }
    }

    fn advance(&self, n: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(n);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
