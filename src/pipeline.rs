//! The extract → rewrite → repack pipeline for one archive.
//!
//! [`run`] executes the stages strictly in order on the calling thread:
//!
//! ```text
//! Idle → Extracting → Rewriting → Repacking → Done
//! ```
//!
//! Any component error ends the run and is returned as
//! [`Error::Pipeline`] carrying the stage it occurred in. The working
//! directory is removed on every exit path, including cancellation through
//! [`ProgressReporter::should_cancel`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::format::ArchiveFormat;
use crate::progress::{NoProgress, ProgressReporter};
use crate::read::{self, ExtractOptions, ExtractResult};
use crate::rewrite::{self, MatchMode, PatternSet, Replacements, RewriteOptions, RewriteResult};
use crate::safety::PathSafety;
use crate::write::{self, EntryFailurePolicy, RepackOptions, RepackResult};
use crate::{Error, Result};

/// Prefix of the output archive's file name.
pub const OUTPUT_PREFIX: &str = "new_";

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Not started; configuration is being validated.
    Idle,
    /// Unpacking the input archive.
    Extracting,
    /// Substituting sensitive tokens.
    Rewriting,
    /// Writing the output ZIP.
    Repacking,
    /// Finished successfully.
    Done,
}

impl Stage {
    /// Returns the lowercase name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Extracting => "extracting",
            Stage::Rewriting => "rewriting",
            Stage::Repacking => "repacking",
            Stage::Done => "done",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::Extracting => 1,
            Stage::Rewriting => 2,
            Stage::Repacking => 3,
            Stage::Done => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Stage::Extracting,
            2 => Stage::Rewriting,
            3 => Stage::Repacking,
            4 => Stage::Done,
            _ => Stage::Idle,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four user-supplied values of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactConfig {
    /// Replacement for IP addresses.
    pub ip: String,
    /// Replacement for computer names.
    pub computer_name: String,
    /// Replacement for user names.
    pub user_name: String,
    /// The archive to redact.
    pub archive_path: PathBuf,
}

impl RedactConfig {
    /// Creates a configuration.
    pub fn new(
        ip: impl Into<String>,
        computer_name: impl Into<String>,
        user_name: impl Into<String>,
        archive_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ip: ip.into(),
            computer_name: computer_name.into(),
            user_name: user_name.into(),
            archive_path: archive_path.into(),
        }
    }

    /// Returns the replacement values.
    pub fn replacements(&self) -> Replacements {
        Replacements::new(&self.ip, &self.computer_name, &self.user_name)
    }
}

/// Options controlling a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Directory the output archive is written to. Default: current directory.
    pub output_dir: Option<PathBuf>,
    /// Working directory to use instead of a fresh temporary one.
    ///
    /// It must be absent or empty.
    pub work_dir: Option<PathBuf>,
    /// Keep a caller-supplied working directory after the run.
    ///
    /// Has no effect on the default temporary directory.
    pub keep_work_dir: bool,
    /// How names are recognized.
    pub match_mode: MatchMode,
    /// Path policy for archive entries.
    pub path_safety: PathSafety,
    /// Per-entry policy while repacking.
    pub failure_policy: EntryFailurePolicy,
    /// Replace rewritten files atomically. Default: `true`.
    pub atomic_writes: bool,
    /// Replace an existing output archive.
    pub overwrite: bool,
    /// Cap on the total bytes extracted.
    pub max_extract_bytes: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            work_dir: None,
            keep_work_dir: false,
            match_mode: MatchMode::default(),
            path_safety: PathSafety::default(),
            failure_policy: EntryFailurePolicy::default(),
            atomic_writes: true,
            overwrite: false,
            max_extract_bytes: None,
        }
    }
}

impl PipelineOptions {
    /// Creates pipeline options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Sets an explicit working directory.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Keeps the explicit working directory after the run.
    pub fn keep_work_dir(mut self, keep: bool) -> Self {
        self.keep_work_dir = keep;
        self
    }

    /// Sets the name match mode.
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Sets the path safety policy.
    pub fn path_safety(mut self, policy: PathSafety) -> Self {
        self.path_safety = policy;
        self
    }

    /// Sets the repack failure policy.
    pub fn failure_policy(mut self, policy: EntryFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets whether rewritten files are replaced atomically.
    pub fn atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    /// Sets whether an existing output archive may be replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Caps the total bytes extracted.
    pub fn max_extract_bytes(mut self, limit: u64) -> Self {
        self.max_extract_bytes = Some(limit);
        self
    }

    fn extract_options(&self) -> ExtractOptions {
        let options = ExtractOptions::new().path_safety(self.path_safety);
        match self.max_extract_bytes {
            Some(limit) => options.max_total_bytes(limit),
            None => options,
        }
    }

    fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions::new().atomic_writes(self.atomic_writes)
    }

    fn repack_options(&self) -> RepackOptions {
        RepackOptions::new()
            .overwrite(self.overwrite)
            .failure_policy(self.failure_policy)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Path of the output ZIP.
    pub output_path: PathBuf,
    /// Extraction statistics.
    pub extract: ExtractResult,
    /// Rewrite statistics.
    pub rewrite: RewriteResult,
    /// Repack statistics.
    pub repack: RepackResult,
    /// The working directory, if it was kept.
    pub kept_work_dir: Option<PathBuf>,
}

/// Computes `<output_dir>/new_<archive file name>`.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use arcanon::pipeline::output_path_for;
///
/// let path = output_path_for(Path::new("/data/logs.rar"), Some(Path::new("/out"))).unwrap();
/// assert_eq!(path, Path::new("/out/new_logs.rar"));
/// ```
pub fn output_path_for(archive_path: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    let file_name = archive_path
        .file_name()
        .ok_or_else(|| Error::UnsupportedFormat {
            path: archive_path.display().to_string(),
        })?;
    let mut name = std::ffi::OsString::from(OUTPUT_PREFIX);
    name.push(file_name);
    Ok(output_dir.unwrap_or_else(|| Path::new(".")).join(name))
}

/// Scratch directory for one run, removed on drop.
enum WorkDir {
    Temp(TempDir),
    Supplied { path: PathBuf, keep: bool },
}

impl WorkDir {
    fn prepare(options: &PipelineOptions) -> Result<Self> {
        let Some(path) = &options.work_dir else {
            let dir = tempfile::Builder::new().prefix("arcanon-").tempdir()?;
            return Ok(WorkDir::Temp(dir));
        };

        if path.exists() {
            let occupied = !path.is_dir() || fs::read_dir(path)?.next().is_some();
            if occupied {
                return Err(Error::WorkDirNotEmpty {
                    path: path.display().to_string(),
                });
            }
        } else {
            fs::create_dir_all(path)?;
        }
        Ok(WorkDir::Supplied {
            path: path.clone(),
            keep: options.keep_work_dir,
        })
    }

    fn path(&self) -> &Path {
        match self {
            WorkDir::Temp(dir) => dir.path(),
            WorkDir::Supplied { path, .. } => path,
        }
    }

    fn kept_path(&self) -> Option<PathBuf> {
        match self {
            WorkDir::Supplied { path, keep: true } => Some(path.clone()),
            _ => None,
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let WorkDir::Supplied { path, keep: false } = self {
            if let Err(e) = fs::remove_dir_all(&*path) {
                log::warn!("Failed to remove working directory {}: {}", path.display(), e);
            }
        }
    }
}

/// Runs the pipeline without progress reporting.
pub fn run(config: &RedactConfig, options: &PipelineOptions) -> Result<PipelineReport> {
    run_with_progress(config, options, &mut NoProgress)
}

/// Runs the pipeline, reporting stages and rewrite progress.
///
/// The reporter receives exactly one `on_finish` call, after the working
/// directory has been removed.
pub fn run_with_progress<P: ProgressReporter>(
    config: &RedactConfig,
    options: &PipelineOptions,
    progress: &mut P,
) -> Result<PipelineReport> {
    let outcome = execute(config, options, progress);
    match &outcome {
        Ok(report) => progress.on_finish(Ok(&report.output_path)),
        Err(e) => {
            log::error!("Redaction of {} failed: {}", config.archive_path.display(), e);
            progress.on_finish(Err(e));
        }
    }
    outcome
}

fn execute<P: ProgressReporter>(
    config: &RedactConfig,
    options: &PipelineOptions,
    progress: &mut P,
) -> Result<PipelineReport> {
    let archive_path = config.archive_path.as_path();

    let idle = |e: Error| e.in_stage(Stage::Idle);
    let patterns = PatternSet::new(&config.replacements(), options.match_mode).map_err(idle)?;
    let output_path = output_path_for(archive_path, options.output_dir.as_deref()).map_err(idle)?;
    if !options.overwrite && output_path.exists() {
        return Err(idle(Error::OutputExists {
            path: output_path.display().to_string(),
        }));
    }

    let stage = enter(progress, Stage::Extracting);
    checkpoint(progress, stage)?;
    let in_stage = |e: Error| e.in_stage(stage);
    ArchiveFormat::from_path(archive_path).map_err(in_stage)?;
    let work = WorkDir::prepare(options).map_err(in_stage)?;
    let extract = read::extract(archive_path, work.path(), &options.extract_options())
        .map_err(in_stage)?;

    let stage = enter(progress, Stage::Rewriting);
    let rewrite = rewrite::rewrite_tree(work.path(), &patterns, &options.rewrite_options(), progress)
        .map_err(|e| e.in_stage(stage))?;

    let stage = enter(progress, Stage::Repacking);
    checkpoint(progress, stage)?;
    let in_stage = |e: Error| e.in_stage(stage);
    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir).map_err(|e| in_stage(e.into()))?;
    }
    let repack =
        write::repack(work.path(), &output_path, &options.repack_options()).map_err(in_stage)?;
    for failure in &repack.failures {
        progress.on_warning(&format!(
            "skipped {}: {}",
            failure.path.display(),
            failure.message
        ));
    }

    let kept_work_dir = work.kept_path();
    drop(work);
    enter(progress, Stage::Done);

    Ok(PipelineReport {
        output_path,
        extract,
        rewrite,
        repack,
        kept_work_dir,
    })
}

fn enter<P: ProgressReporter>(progress: &mut P, stage: Stage) -> Stage {
    log::info!("Stage: {}", stage);
    progress.on_stage(stage);
    stage
}

fn checkpoint<P: ProgressReporter>(progress: &P, stage: Stage) -> Result<()> {
    if progress.should_cancel() {
        log::info!("Cancelled at start of {}", stage);
        return Err(Error::Cancelled.in_stage(stage));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::StatisticsProgress;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = ::zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, ::zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn config(archive: &Path) -> RedactConfig {
        RedactConfig::new("192.168.0.1", "NewComputerName", "NewUserName", archive)
    }

    #[test]
    fn test_stage_display_and_roundtrip() {
        for stage in [
            Stage::Idle,
            Stage::Extracting,
            Stage::Rewriting,
            Stage::Repacking,
            Stage::Done,
        ] {
            assert_eq!(Stage::from_u8(stage.as_u8()), stage);
        }
        assert_eq!(Stage::Rewriting.to_string(), "rewriting");
    }

    #[test]
    fn test_output_path_defaults_to_current_dir() {
        let path = output_path_for(Path::new("a/b/logs.zip"), None).unwrap();
        assert_eq!(path, Path::new("./new_logs.zip"));
    }

    #[test]
    fn test_output_path_without_file_name() {
        assert!(output_path_for(Path::new("/"), None).is_err());
    }

    #[test]
    fn test_run_reports_stages_in_order() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(&archive, &[("a.txt", "User: alice")]);
        let out = dir.path().join("out");

        let mut progress = StatisticsProgress::new();
        let report = run_with_progress(
            &config(&archive),
            &PipelineOptions::new().output_dir(&out),
            &mut progress,
        )
        .unwrap();

        assert_eq!(
            progress.stages,
            vec![Stage::Extracting, Stage::Rewriting, Stage::Repacking, Stage::Done]
        );
        assert_eq!(progress.finish_calls, 1);
        assert_eq!(report.output_path, out.join("new_logs.zip"));
        assert_eq!(report.rewrite.matches.user_name, 1);
        assert!(report.output_path.is_file());
    }

    #[test]
    fn test_failure_carries_stage_and_single_finish() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, "not a zip").unwrap();

        let mut progress = StatisticsProgress::new();
        let err = run_with_progress(
            &config(&archive),
            &PipelineOptions::new().output_dir(dir.path()),
            &mut progress,
        )
        .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Extracting));
        assert!(err.is_corruption());
        assert_eq!(progress.finish_calls, 1);
        assert!(matches!(progress.outcome, Some(Err(_))));
        assert!(!dir.path().join("new_broken.zip").exists());
    }

    #[test]
    fn test_existing_output_fails_before_extracting() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(&archive, &[("a.txt", "x")]);
        fs::write(dir.path().join("new_logs.zip"), "old").unwrap();

        let mut progress = StatisticsProgress::new();
        let err = run_with_progress(
            &config(&archive),
            &PipelineOptions::new().output_dir(dir.path()),
            &mut progress,
        )
        .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Idle));
        assert!(matches!(err.root_cause(), Error::OutputExists { .. }));
        assert!(progress.stages.is_empty());
    }

    #[test]
    fn test_supplied_work_dir_removed() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(&archive, &[("a.txt", "x")]);
        let work = dir.path().join("work");

        let options = PipelineOptions::new()
            .output_dir(dir.path())
            .work_dir(&work);
        let report = run(&config(&archive), &options).unwrap();

        assert!(!work.exists());
        assert!(report.kept_work_dir.is_none());
    }

    #[test]
    fn test_supplied_work_dir_kept() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(&archive, &[("a.txt", "login=bob")]);
        let work = dir.path().join("work");

        let options = PipelineOptions::new()
            .output_dir(dir.path())
            .work_dir(&work)
            .keep_work_dir(true);
        let report = run(&config(&archive), &options).unwrap();

        assert_eq!(report.kept_work_dir.as_deref(), Some(work.as_path()));
        assert_eq!(
            fs::read_to_string(work.join("a.txt")).unwrap(),
            "login=NewUserName"
        );
    }

    #[test]
    fn test_non_empty_work_dir_rejected() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(&archive, &[("a.txt", "x")]);
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        fs::write(work.join("keep.txt"), "precious").unwrap();

        let options = PipelineOptions::new()
            .output_dir(dir.path())
            .work_dir(&work);
        let err = run(&config(&archive), &options).unwrap_err();

        assert!(matches!(err.root_cause(), Error::WorkDirNotEmpty { .. }));
        assert_eq!(fs::read_to_string(work.join("keep.txt")).unwrap(), "precious");
    }

    #[test]
    fn test_work_dir_removed_after_failure() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, "garbage").unwrap();
        let work = dir.path().join("work");

        let options = PipelineOptions::new()
            .output_dir(dir.path())
            .work_dir(&work);
        assert!(run(&config(&archive), &options).is_err());
        assert!(!work.exists());
    }
}
