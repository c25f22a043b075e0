//! Background execution of the pipeline on Tokio.
//!
//! The pipeline itself is synchronous file I/O, so it runs on the blocking
//! thread pool via [`tokio::task::spawn_blocking`]. Progress reaches the
//! async side as [`ProgressEvent`]s over an unbounded channel, which the
//! blocking worker can send to without awaiting.
//!
//! # Example
//!
//! ```rust,no_run
//! use arcanon::async_pipeline::{ProgressEvent, spawn};
//! use arcanon::{PipelineOptions, RedactConfig};
//!
//! # async fn example() -> arcanon::Result<()> {
//! let config = RedactConfig::new("10.0.0.1", "HOST", "user", "logs.zip");
//! let (handle, mut events) = spawn(config, PipelineOptions::default());
//!
//! while let Some(event) = events.recv().await {
//!     if let ProgressEvent::Percent(p) = event {
//!         println!("{p}%");
//!     }
//! }
//! let report = handle.await.map_err(|e| arcanon::Error::Io(std::io::Error::other(e)))??;
//! println!("Wrote {}", report.output_path.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::pipeline::{self, PipelineOptions, PipelineReport, RedactConfig, Stage};
use crate::progress::ProgressReporter;
use crate::{Error, Result};

/// Progress events sent by [`ChannelProgressReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The pipeline entered a stage.
    Stage(Stage),
    /// Number of files the rewrite pass will visit.
    Total {
        /// File count.
        files: u64,
    },
    /// A file has been rewritten.
    FileComplete {
        /// Path relative to the working directory.
        path: PathBuf,
        /// Files done so far.
        files_done: u64,
        /// Total files.
        total_files: u64,
    },
    /// Rewrite completion percentage.
    Percent(u8),
    /// A non-fatal problem.
    Warning(String),
    /// The run ended. Always the last event.
    Finished(std::result::Result<PathBuf, String>),
}

/// A progress reporter that forwards every callback as a [`ProgressEvent`].
///
/// Events sent after the receiver is dropped are discarded.
pub struct ChannelProgressReporter {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelProgressReporter {
    /// Creates a new channel-based progress reporter.
    ///
    /// Returns a tuple of (reporter, receiver).
    pub fn new() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { sender: tx }, rx)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn on_stage(&mut self, stage: Stage) {
        self.send(ProgressEvent::Stage(stage));
    }

    fn on_total(&mut self, total_files: u64) {
        self.send(ProgressEvent::Total { files: total_files });
    }

    fn on_file_complete(&mut self, path: &Path, files_done: u64, total_files: u64) {
        self.send(ProgressEvent::FileComplete {
            path: path.to_path_buf(),
            files_done,
            total_files,
        });
    }

    fn on_percent(&mut self, percent: u8) {
        self.send(ProgressEvent::Percent(percent));
    }

    fn on_warning(&mut self, message: &str) {
        self.send(ProgressEvent::Warning(message.to_string()));
    }

    fn on_finish(&mut self, outcome: std::result::Result<&Path, &Error>) {
        self.send(ProgressEvent::Finished(match outcome {
            Ok(path) => Ok(path.to_path_buf()),
            Err(err) => Err(err.to_string()),
        }));
    }
}

fn join_error(err: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(err))
}

/// Runs the pipeline on the blocking pool with a caller-supplied reporter.
pub fn spawn_with_reporter<P>(
    config: RedactConfig,
    options: PipelineOptions,
    mut reporter: P,
) -> JoinHandle<Result<PipelineReport>>
where
    P: ProgressReporter + 'static,
{
    tokio::task::spawn_blocking(move || {
        pipeline::run_with_progress(&config, &options, &mut reporter)
    })
}

/// Runs the pipeline in the background and streams its progress.
///
/// The channel closes after the [`ProgressEvent::Finished`] event.
pub fn spawn(
    config: RedactConfig,
    options: PipelineOptions,
) -> (JoinHandle<Result<PipelineReport>>, UnboundedReceiver<ProgressEvent>) {
    let (reporter, events) = ChannelProgressReporter::new();
    (spawn_with_reporter(config, options, reporter), events)
}

/// Runs the pipeline on the blocking pool and awaits the result.
///
/// # Errors
///
/// Returns the pipeline's error, or [`Error::Io`] if the worker panicked.
pub async fn run_async(config: RedactConfig, options: PipelineOptions) -> Result<PipelineReport> {
    tokio::task::spawn_blocking(move || pipeline::run(&config, &options))
        .await
        .map_err(join_error)?
}
