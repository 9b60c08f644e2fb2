//! Progress and status reporting
//!
//! The orchestrator never prints. It notifies an injected [`ProgressReporter`],
//! which decides how (and whether) to render anything:
//!
//! - [`BarReporter`]: colored status lines plus an `indicatif` progress bar
//! - [`LogReporter`]: `tracing` events only, for non-interactive runs

use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use tracing::{debug, error, info, warn};

use crate::error::{ExportFailure, TeardownError};
use crate::utils::time::{format_elapsed, rate};

use super::coordinator::{ExportState, ExportSummary};
use super::descriptor::ExportDescriptor;
use super::progress::ProgressEvent;

/// Fire-and-forget sink for run notifications
pub trait ProgressReporter: Send + Sync {
    /// A collection export is about to start
    fn collection_started(&self, _desc: &ExportDescriptor) {}

    /// The export of `collection` moved to `state`
    fn state_changed(&self, _collection: &str, _state: ExportState) {}

    /// The source counted `total` documents to export
    fn counted(&self, _collection: &str, _total: u64) {}

    /// One more document was acknowledged by the destination
    fn progress(&self, event: &ProgressEvent);

    /// A collection export completed
    fn collection_finished(&self, summary: &ExportSummary);

    /// A collection export failed; the queue stops after this
    fn collection_failed(&self, failure: &ExportFailure);

    /// Closing a connection failed after the run
    fn teardown_failed(&self, _error: &TeardownError) {}
}

/// Reporter that only emits `tracing` events
///
/// Progress is logged at `info` each time the percentage crosses a multiple
/// of ten, and at `debug` for every document.
#[derive(Default)]
pub struct LogReporter {
    last_decile: AtomicU8,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogReporter {
    fn collection_started(&self, desc: &ExportDescriptor) {
        self.last_decile.store(0, Ordering::Relaxed);
        info!("====> exporting collection [{}]", desc.name);
    }

    fn state_changed(&self, collection: &str, state: ExportState) {
        debug!("----> [{}] {}", collection, state);
    }

    fn counted(&self, collection: &str, total: u64) {
        info!("----> found {} documents to export from [{}]", total, collection);
    }

    fn progress(&self, event: &ProgressEvent) {
        debug!(
            "------> processed {} documents [{}%]",
            event.processed, event.percentage
        );

        let decile = event.percentage / 10;
        if self.last_decile.swap(decile, Ordering::Relaxed) != decile {
            info!(
                "------> [{}] processed {} of {} documents [{}%]",
                event.collection, event.processed, event.total, event.percentage
            );
        }
    }

    fn collection_finished(&self, summary: &ExportSummary) {
        info!(
            "====> collection [{}] - exported successfully ({} documents)",
            summary.collection, summary.exported
        );
        info!(
            "====> time elapsed {} ({:.1} docs/s)",
            format_elapsed(summary.elapsed),
            rate(summary.exported, summary.elapsed)
        );
    }

    fn collection_failed(&self, failure: &ExportFailure) {
        error!("====> {}", failure);
    }

    fn teardown_failed(&self, err: &TeardownError) {
        warn!("{}", err);
    }
}

/// Terminal reporter with a progress bar per collection
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
    color: bool,
}

impl BarReporter {
    /// Create a terminal reporter
    ///
    /// # Arguments
    /// * `color` - Whether status lines are colored
    pub fn new(color: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            color,
        }
    }

    fn paint(&self, style: Style, text: String) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text
        }
    }

    fn new_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.magenta/blue}] {pos}/{len} ({percent}%) {per_sec}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl ProgressReporter for BarReporter {
    fn collection_started(&self, desc: &ExportDescriptor) {
        let line = format!("====> exporting collection [{}]", desc.name);
        println!("{}", self.paint(Color::White.bold(), line));
    }

    fn state_changed(&self, collection: &str, state: ExportState) {
        debug!("----> [{}] {}", collection, state);
    }

    fn counted(&self, _collection: &str, total: u64) {
        println!("----> found {} documents to export", total);
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(Self::new_bar(total));
        }
    }

    fn progress(&self, event: &ProgressEvent) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.set_position(event.processed);
            }
        }
    }

    fn collection_finished(&self, summary: &ExportSummary) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        let line = format!(
            "====> collection [{}] - exported successfully ({} documents)",
            summary.collection, summary.exported
        );
        println!("{}", self.paint(Color::Green.normal(), line));
        let line = format!("====> time elapsed {}\n", format_elapsed(summary.elapsed));
        println!("{}", self.paint(Color::Green.normal(), line));
    }

    fn collection_failed(&self, failure: &ExportFailure) {
        if let Some(bar) = self.take_bar() {
            bar.abandon();
        }
        let line = format!("====> {}", failure);
        eprintln!("{}", self.paint(Color::Red.bold(), line));
    }

    fn teardown_failed(&self, err: &TeardownError) {
        eprintln!("{}", self.paint(Color::Yellow.normal(), err.to_string()));
    }
}
