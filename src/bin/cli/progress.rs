//! Progress bar implementation for the redact command.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arcanon::progress::ProgressReporter;
use arcanon::{Error, Stage};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for a pipeline run.
///
/// The bar tracks the 0-100 rewrite percentage; its message shows the
/// current stage. The run is cancelled once `interrupted` is set.
pub struct CliProgress {
    bar: ProgressBar,
    interrupted: Arc<AtomicBool>,
}

impl CliProgress {
    /// Creates a new progress display
    pub fn new(quiet: bool, interrupted: Arc<AtomicBool>) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(100);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {msg:>10} [{bar:40.cyan/blue}] {pos:>3}%")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            pb
        };

        Self { bar, interrupted }
    }
}

impl ProgressReporter for CliProgress {
    fn on_stage(&mut self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn on_percent(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_warning(&mut self, message: &str) {
        self.bar.println(format!("warning: {}", message));
    }

    fn on_finish(&mut self, outcome: Result<&Path, &Error>) {
        match outcome {
            Ok(_) => self.bar.finish_and_clear(),
            Err(e) if e.is_cancelled() => self.bar.abandon_with_message("interrupted"),
            Err(_) => self.bar.abandon_with_message("failed"),
        }
    }

    fn should_cancel(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}
