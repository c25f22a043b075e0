//! Progress reporting for redaction runs.
//!
//! A [`ProgressReporter`] observes one pipeline run:
//! - one [`on_stage`](ProgressReporter::on_stage) call per stage transition
//! - per-file completion and an integer 0-100 percentage while rewriting
//! - exactly one terminal [`on_finish`](ProgressReporter::on_finish) call
//!
//! # Example
//!
//! ```rust,no_run
//! use arcanon::progress::StatisticsProgress;
//! use arcanon::{PipelineOptions, RedactConfig};
//!
//! let config = RedactConfig::new("10.0.0.1", "HOST", "user", "logs.zip");
//! let mut progress = StatisticsProgress::new();
//! arcanon::pipeline::run_with_progress(&config, &PipelineOptions::default(), &mut progress)?;
//! assert_eq!(progress.state().percent, 100);
//! # Ok::<(), arcanon::Error>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use crate::Error;
use crate::pipeline::Stage;

// Floating point versions for formatting calculations
const BYTES_KB: f64 = 1024.0;
const BYTES_MB: f64 = BYTES_KB * 1024.0;
const BYTES_GB: f64 = BYTES_MB * 1024.0;

/// Returns `floor(done * 100 / total)`, clamped to 100.
///
/// An empty workload counts as complete.
///
/// # Examples
///
/// ```rust
/// use arcanon::progress::percent_complete;
///
/// assert_eq!(percent_complete(1, 3), 33);
/// assert_eq!(percent_complete(2, 3), 66);
/// assert_eq!(percent_complete(3, 3), 100);
/// assert_eq!(percent_complete(0, 0), 100);
/// ```
pub fn percent_complete(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (u128::from(done) * 100) / u128::from(total);
    percent.min(100) as u8
}

/// Progress reporting trait for redaction runs.
///
/// Every method has an empty default so implementors only override what
/// they display.
pub trait ProgressReporter: Send {
    /// Called when the pipeline enters a new stage.
    fn on_stage(&mut self, stage: Stage) {
        let _ = stage;
    }

    /// Called once before rewriting with the number of files to scan.
    fn on_total(&mut self, total_files: u64) {
        let _ = total_files;
    }

    /// Called after each file has been rewritten (or left unchanged).
    fn on_file_complete(&mut self, path: &Path, files_done: u64, total_files: u64) {
        let _ = (path, files_done, total_files);
    }

    /// Called after each file with the rewrite completion percentage.
    ///
    /// Values are non-decreasing within a run.
    fn on_percent(&mut self, percent: u8) {
        let _ = percent;
    }

    /// Called on any non-fatal problem, such as a skipped repack entry.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }

    /// Called exactly once when the run ends.
    ///
    /// On success the argument holds the output archive path.
    fn on_finish(&mut self, outcome: Result<&Path, &Error>) {
        let _ = outcome;
    }

    /// Checks if cancellation has been requested.
    ///
    /// Polled between stages and before each file is rewritten. Returning
    /// `true` ends the run with [`Error::Cancelled`] after cleanup.
    ///
    /// Default implementation returns `false` (no cancellation).
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Current pipeline stage.
    pub stage: Stage,
    /// Number of files to rewrite.
    pub total_files: u64,
    /// Files rewritten so far.
    pub files_done: u64,
    /// Last reported percentage.
    pub percent: u8,
    /// Most recently completed file.
    pub current_file: Option<PathBuf>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            total_files: 0,
            files_done: 0,
            percent: 0,
            current_file: None,
        }
    }
}

impl ProgressState {
    /// Creates a new progress state.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A progress reporter that does nothing (null object pattern).
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that records everything it observes.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// The progress state.
    pub state: ProgressState,
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
    /// Every percentage reported, in order.
    pub percents: Vec<u8>,
    /// Warnings collected.
    pub warnings: Vec<String>,
    /// Terminal outcome: the output path, or the error message.
    pub outcome: Option<Result<PathBuf, String>>,
    /// Number of `on_finish` calls received.
    pub finish_calls: usize,
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected state.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_stage(&mut self, stage: Stage) {
        self.state.stage = stage;
        self.stages.push(stage);
    }

    fn on_total(&mut self, total_files: u64) {
        self.state.total_files = total_files;
    }

    fn on_file_complete(&mut self, path: &Path, files_done: u64, _total_files: u64) {
        self.state.files_done = files_done;
        self.state.current_file = Some(path.to_path_buf());
    }

    fn on_percent(&mut self, percent: u8) {
        self.state.percent = percent;
        self.percents.push(percent);
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn on_finish(&mut self, outcome: Result<&Path, &Error>) {
        self.finish_calls += 1;
        self.outcome = Some(match outcome {
            Ok(path) => Ok(path.to_path_buf()),
            Err(err) => Err(err.to_string()),
        });
    }
}

/// A thread-safe progress reporter using atomics.
///
/// Lets another thread poll the stage and percentage of a running pipeline,
/// and stop it with [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct AtomicProgress {
    stage: AtomicU8,
    total_files: AtomicU64,
    files_done: AtomicU64,
    percent: AtomicU8,
    finished: AtomicBool,
    failed: AtomicBool,
    cancelled: AtomicBool,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgress {
    /// Creates a new atomic progress reporter.
    pub fn new() -> Self {
        Self {
            stage: AtomicU8::new(Stage::Idle.as_u8()),
            total_files: AtomicU64::new(0),
            files_done: AtomicU64::new(0),
            percent: AtomicU8::new(0),
            finished: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Creates a shared atomic progress reporter.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the current stage.
    pub fn stage(&self) -> Stage {
        Stage::from_u8(self.stage.load(Ordering::Relaxed))
    }

    /// Returns the number of files to rewrite.
    pub fn total_files(&self) -> u64 {
        self.total_files.load(Ordering::Relaxed)
    }

    /// Returns the number of files rewritten so far.
    pub fn files_done(&self) -> u64 {
        self.files_done.load(Ordering::Relaxed)
    }

    /// Returns the last reported percentage.
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Returns whether the run has ended.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Returns whether the run ended with an error.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Requests that the run stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn record_stage(&self, stage: Stage) {
        self.stage.store(stage.as_u8(), Ordering::Relaxed);
    }

    fn record_file(&self, files_done: u64, total_files: u64) {
        self.total_files.store(total_files, Ordering::Relaxed);
        self.files_done.store(files_done, Ordering::Relaxed);
    }

    fn record_finish(&self, failed: bool) {
        self.failed.store(failed, Ordering::Release);
        self.finished.store(true, Ordering::Release);
    }
}

impl ProgressReporter for AtomicProgress {
    fn on_stage(&mut self, stage: Stage) {
        self.record_stage(stage);
    }

    fn on_total(&mut self, total_files: u64) {
        self.total_files.store(total_files, Ordering::Relaxed);
    }

    fn on_file_complete(&mut self, _path: &Path, files_done: u64, total_files: u64) {
        self.record_file(files_done, total_files);
    }

    fn on_percent(&mut self, percent: u8) {
        self.percent.store(percent, Ordering::Relaxed);
    }

    fn on_finish(&mut self, outcome: Result<&Path, &Error>) {
        self.record_finish(outcome.is_err());
    }

    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }
}

/// Progress reporter for shared `Arc<AtomicProgress>`.
impl ProgressReporter for Arc<AtomicProgress> {
    fn on_stage(&mut self, stage: Stage) {
        self.record_stage(stage);
    }

    fn on_total(&mut self, total_files: u64) {
        self.total_files.store(total_files, Ordering::Relaxed);
    }

    fn on_file_complete(&mut self, _path: &Path, files_done: u64, total_files: u64) {
        self.record_file(files_done, total_files);
    }

    fn on_percent(&mut self, percent: u8) {
        self.percent.store(percent, Ordering::Relaxed);
    }

    fn on_finish(&mut self, outcome: Result<&Path, &Error>) {
        self.record_finish(outcome.is_err());
    }

    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }
}

/// Forwards each rewrite percentage to a closure and ignores other events.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F> ClosureProgress<F>
where
    F: FnMut(u8) + Send,
{
    /// Creates a progress reporter from a closure.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgress<F>
where
    F: FnMut(u8) + Send,
{
    fn on_percent(&mut self, percent: u8) {
        (self.callback)(percent)
    }
}

/// Wraps `f` as a [`ProgressReporter`] that only sees percentages.
///
/// ```rust,no_run
/// use arcanon::progress::progress_fn;
/// use arcanon::{PipelineOptions, RedactConfig};
///
/// let config = RedactConfig::new("10.0.0.1", "HOST", "user", "logs.zip");
/// let mut bar = progress_fn(|percent| eprint!("\r{percent:>3}%"));
/// arcanon::pipeline::run_with_progress(&config, &PipelineOptions::default(), &mut bar)?;
/// # Ok::<(), arcanon::Error>(())
/// ```
pub fn progress_fn<F>(f: F) -> ClosureProgress<F>
where
    F: FnMut(u8) + Send,
{
    ClosureProgress::new(f)
}

/// Formats bytes as a human-readable string using IEC units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```rust
/// use arcanon::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let bytes_f64 = bytes as f64;
    if bytes_f64 < BYTES_KB {
        format!("{} B", bytes)
    } else if bytes_f64 < BYTES_MB {
        format!("{:.1} KiB", bytes_f64 / BYTES_KB)
    } else if bytes_f64 < BYTES_GB {
        format!("{:.1} MiB", bytes_f64 / BYTES_MB)
    } else {
        format!("{:.1} GiB", bytes_f64 / BYTES_GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_complete_floors() {
        assert_eq!(percent_complete(0, 7), 0);
        assert_eq!(percent_complete(1, 7), 14);
        assert_eq!(percent_complete(6, 7), 85);
        assert_eq!(percent_complete(7, 7), 100);
    }

    #[test]
    fn test_percent_complete_clamps() {
        assert_eq!(percent_complete(9, 7), 100);
        assert_eq!(percent_complete(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_no_progress() {
        let mut progress = NoProgress;
        progress.on_stage(Stage::Rewriting);
        progress.on_percent(50);
        progress.on_finish(Ok(Path::new("new_a.zip")));
    }

    #[test]
    fn test_statistics_progress() {
        let mut progress = StatisticsProgress::new();
        progress.on_stage(Stage::Rewriting);
        progress.on_total(2);
        progress.on_file_complete(Path::new("a.txt"), 1, 2);
        progress.on_percent(50);
        progress.on_warning("skipped b.txt");
        progress.on_finish(Ok(Path::new("new_a.zip")));

        assert_eq!(progress.state().stage, Stage::Rewriting);
        assert_eq!(progress.state().files_done, 1);
        assert_eq!(progress.percents, vec![50]);
        assert_eq!(progress.warnings.len(), 1);
        assert_eq!(progress.finish_calls, 1);
        assert_eq!(progress.outcome, Some(Ok(PathBuf::from("new_a.zip"))));
    }

    #[test]
    fn test_statistics_records_failure() {
        let mut progress = StatisticsProgress::new();
        let err = Error::UnsupportedFormat {
            path: "a.7z".into(),
        };
        progress.on_finish(Err(&err));
        assert!(matches!(progress.outcome, Some(Err(ref msg)) if msg.contains("a.7z")));
    }

    #[test]
    fn test_atomic_progress() {
        let progress = AtomicProgress::shared();
        let mut reporter: Arc<AtomicProgress> = Arc::clone(&progress);

        reporter.on_stage(Stage::Rewriting);
        reporter.on_file_complete(Path::new("a.txt"), 3, 4);
        reporter.on_percent(75);

        assert_eq!(progress.stage(), Stage::Rewriting);
        assert_eq!(progress.files_done(), 3);
        assert_eq!(progress.total_files(), 4);
        assert_eq!(progress.percent(), 75);
        assert!(!progress.is_finished());

        reporter.on_finish(Ok(Path::new("out.zip")));
        assert!(progress.is_finished());
        assert!(!progress.is_failed());
    }

    #[test]
    fn test_atomic_cancel() {
        let progress = AtomicProgress::shared();
        let reporter: Arc<AtomicProgress> = Arc::clone(&progress);
        assert!(!reporter.should_cancel());
        progress.cancel();
        assert!(reporter.should_cancel());
        assert!(!NoProgress.should_cancel());
    }

    #[test]
    fn test_closure_progress() {
        let mut seen = Vec::new();
        {
            let mut progress = progress_fn(|percent| seen.push(percent));
            progress.on_percent(10);
            progress.on_percent(100);
        }
        assert_eq!(seen, vec![10, 100]);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes_iec(500), "500 B");
        assert_eq!(format_bytes_iec(1500), "1.5 KiB");
        assert_eq!(format_bytes_iec(1500 * 1024), "1.5 MiB");
        assert_eq!(format_bytes_iec(1500 * 1024 * 1024), "1.5 GiB");
    }
}
