//! In-place content rewriting.
//!
//! [`rewrite_tree`] visits every regular file under a directory, runs the
//! [`PatternSet`] over its bytes and writes the result back to the same path.
//! Bytes outside matches are preserved exactly, whatever the file's encoding.
//!
//! # Example
//!
//! ```rust,no_run
//! use arcanon::progress::NoProgress;
//! use arcanon::rewrite::{MatchMode, PatternSet, Replacements, RewriteOptions, rewrite_tree};
//!
//! let replacements = Replacements::new("10.0.0.1", "HOST", "user");
//! let patterns = PatternSet::new(&replacements, MatchMode::Labeled)?;
//! let result = rewrite_tree("scratch", &patterns, &RewriteOptions::default(), &mut NoProgress)?;
//! println!("{} of {} files changed", result.files_changed, result.files_scanned);
//! # Ok::<(), arcanon::Error>(())
//! ```

mod patterns;

pub use patterns::{
    BARE_NAME_PATTERN, Category, IP_PATTERN, LABELED_COMPUTER_PATTERN, LABELED_USER_PATTERN,
    MatchCounts, MatchMode, Pattern, PatternSet, Replacements,
};

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{Error, Result};
use crate::progress::{ProgressReporter, percent_complete};

/// Log target carrying file contents before and after substitution.
///
/// Only enabled at trace level; the lines contain the sensitive values.
pub const CONTENT_LOG_TARGET: &str = "arcanon::content";

/// Options for the rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Write through a sibling temporary file renamed over the original.
    ///
    /// Default: `true`. When disabled, files are truncated and rewritten in
    /// place.
    pub atomic_writes: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            atomic_writes: true,
        }
    }
}

impl RewriteOptions {
    /// Creates rewrite options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether files are replaced atomically.
    pub fn atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }
}

/// Result of a rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteResult {
    /// Regular files read.
    pub files_scanned: usize,
    /// Files whose content changed and was written back.
    pub files_changed: usize,
    /// Total bytes read.
    pub bytes_scanned: u64,
    /// Replacements made per category.
    pub matches: MatchCounts,
}

/// Lists every regular file under `root`, sorted by file name within each
/// directory. Symlinks are not followed.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Rewrites every regular file under `root`.
///
/// The reporter receives the file count up front, then one
/// `on_file_complete` and one `on_percent` call per file.
///
/// # Errors
///
/// Returns [`Error::Io`] on the first file that cannot be read or written;
/// the remaining files are not visited. Returns [`Error::Cancelled`] when the
/// reporter asks to stop; files already rewritten stay rewritten.
pub fn rewrite_tree(
    root: impl AsRef<Path>,
    patterns: &PatternSet,
    options: &RewriteOptions,
    progress: &mut impl ProgressReporter,
) -> Result<RewriteResult> {
    let root = root.as_ref();
    let files = collect_files(root)?;
    let total = files.len() as u64;
    progress.on_total(total);
    log::debug!("Rewriting {} files under {}", total, root.display());

    let mut result = RewriteResult::default();
    for (index, path) in files.iter().enumerate() {
        if progress.should_cancel() {
            log::info!("Rewrite cancelled after {} of {} files", index, total);
            return Err(Error::Cancelled);
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let outcome = rewrite_file(path, patterns, options)?;

        result.files_scanned += 1;
        result.bytes_scanned += outcome.bytes;
        result.matches += outcome.matches;
        if outcome.changed {
            result.files_changed += 1;
            log::debug!(
                "Rewrote {}: {} ip, {} computer, {} user",
                relative.display(),
                outcome.matches.ip,
                outcome.matches.computer_name,
                outcome.matches.user_name
            );
        }

        let done = index as u64 + 1;
        progress.on_file_complete(relative, done, total);
        progress.on_percent(percent_complete(done, total));
    }

    log::info!(
        "Rewrite complete: {} of {} files changed, {} replacements",
        result.files_changed,
        result.files_scanned,
        result.matches.total()
    );
    Ok(result)
}

/// Outcome of rewriting a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcome {
    /// Bytes read.
    pub bytes: u64,
    /// Whether the content changed.
    pub changed: bool,
    /// Replacements made.
    pub matches: MatchCounts,
}

/// Rewrites one file. Unchanged files are left untouched on disk.
pub fn rewrite_file(
    path: &Path,
    patterns: &PatternSet,
    options: &RewriteOptions,
) -> Result<FileOutcome> {
    let original = fs::read(path)?;
    let (rewritten, matches) = patterns.apply_counted(&original);

    let changed = match &rewritten {
        Cow::Borrowed(_) => false,
        Cow::Owned(bytes) => bytes.as_slice() != original.as_slice(),
    };

    if changed {
        if log::log_enabled!(target: CONTENT_LOG_TARGET, log::Level::Trace) {
            log::trace!(
                target: CONTENT_LOG_TARGET,
                "{} before: {}",
                path.display(),
                String::from_utf8_lossy(&original)
            );
            log::trace!(
                target: CONTENT_LOG_TARGET,
                "{} after: {}",
                path.display(),
                String::from_utf8_lossy(&rewritten)
            );
        }
        if options.atomic_writes {
            write_atomic(path, &rewritten)?;
        } else {
            fs::write(path, &rewritten)?;
        }
    }

    Ok(FileOutcome {
        bytes: original.len() as u64,
        changed,
        matches,
    })
}

/// Replaces `path` with `data` via a temporary file in the same directory.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
