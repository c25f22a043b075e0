//! Repacking a directory tree into a ZIP archive.
//!
//! The output is always ZIP, whatever the input format was. Only regular
//! files become entries; directories are implied by entry names.
//!
//! # Example
//!
//! ```rust,no_run
//! use arcanon::write::{RepackOptions, repack};
//!
//! let result = repack("scratch", "new_logs.zip", &RepackOptions::default())?;
//! println!("{} entries written", result.entries_written);
//! # Ok::<(), arcanon::Error>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ::zip::ZipWriter;
use ::zip::write::SimpleFileOptions;

use crate::read::map_zip_error;
use crate::rewrite::collect_files;
use crate::{ArchivePath, Error, Result};

/// What to do when a single entry cannot be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFailurePolicy {
    /// Stop and return the error. The partial output is removed.
    #[default]
    FailFast,
    /// Log the failure at error level, record it and continue.
    ///
    /// The repack still succeeds; callers inspect
    /// [`RepackResult::failures`].
    SkipAndLog,
}

/// Compression method for output entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Deflate (the ZIP default).
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

impl Compression {
    fn to_zip(self) -> ::zip::CompressionMethod {
        match self {
            Compression::Deflated => ::zip::CompressionMethod::Deflated,
            Compression::Stored => ::zip::CompressionMethod::Stored,
        }
    }
}

/// Options for repacking.
#[derive(Debug, Clone, Default)]
pub struct RepackOptions {
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
    /// Per-entry failure policy.
    pub failure_policy: EntryFailurePolicy,
    /// Compression method for every entry.
    pub compression: Compression,
}

impl RepackOptions {
    /// Creates repack options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether an existing output file may be replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the per-entry failure policy.
    pub fn failure_policy(mut self, policy: EntryFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the compression method.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// An entry that was skipped under [`EntryFailurePolicy::SkipAndLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Path of the file relative to the source directory.
    pub path: PathBuf,
    /// Error message.
    pub message: String,
}

/// Result of a repack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepackResult {
    /// Entries stored in the output archive.
    pub entries_written: usize,
    /// Uncompressed bytes stored.
    pub bytes_written: u64,
    /// Entries skipped under [`EntryFailurePolicy::SkipAndLog`].
    pub failures: Vec<EntryFailure>,
}

impl RepackResult {
    /// Returns true if every file was stored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Removes a half-written output file unless the write completed.
struct PartialOutput<'a> {
    path: &'a Path,
    committed: bool,
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(self.path) {
                log::warn!("Failed to remove partial output {}: {}", self.path.display(), e);
            }
        }
    }
}

fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    let mut open = OpenOptions::new();
    open.write(true);
    if overwrite {
        open.create(true).truncate(true);
    } else {
        open.create_new(true);
    }
    open.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => Error::OutputExists {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })
}

/// Reads a file and computes its entry name.
fn load_entry(source_dir: &Path, path: &Path) -> Result<(ArchivePath, Vec<u8>)> {
    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    let name = ArchivePath::from_relative(relative)?;
    let data = fs::read(path)?;
    Ok((name, data))
}

/// Stores every regular file under `source_dir` in a new ZIP at `output_path`.
///
/// Entries are added in sorted path order.
///
/// # Errors
///
/// - [`Error::OutputExists`] if `output_path` exists and overwriting is off
/// - [`Error::Io`] or [`Error::InvalidArchivePath`] for a file that cannot be
///   stored, under [`EntryFailurePolicy::FailFast`]
/// - [`Error::CorruptArchive`] if the ZIP writer itself fails
pub fn repack(
    source_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &RepackOptions,
) -> Result<RepackResult> {
    let source_dir = source_dir.as_ref();
    let output_path = output_path.as_ref();

    let files = collect_files(source_dir)?;
    let file = create_output(output_path, options.overwrite)?;
    let mut guard = PartialOutput {
        path: output_path,
        committed: false,
    };

    let mut writer = ZipWriter::new(file);
    let mut result = RepackResult::default();

    for path in &files {
        let (name, data) = match load_entry(source_dir, path) {
            Ok(entry) => entry,
            Err(e) => match options.failure_policy {
                EntryFailurePolicy::FailFast => return Err(e),
                EntryFailurePolicy::SkipAndLog => {
                    let relative = path.strip_prefix(source_dir).unwrap_or(path);
                    log::error!("Skipping {}: {}", relative.display(), e);
                    result.failures.push(EntryFailure {
                        path: relative.to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            },
        };

        let entry_options = SimpleFileOptions::default()
            .compression_method(options.compression.to_zip())
            .large_file(data.len() as u64 >= u64::from(u32::MAX));
        writer
            .start_file(name.as_str(), entry_options)
            .map_err(|e| map_zip_error(output_path, e))?;
        writer.write_all(&data)?;

        result.entries_written += 1;
        result.bytes_written += data.len() as u64;
        log::trace!("Stored {} ({} bytes)", name, data.len());
    }

    let mut file = writer.finish().map_err(|e| map_zip_error(output_path, e))?;
    file.flush()?;
    guard.committed = true;

    log::info!(
        "Repack complete: {} entries, {} bytes -> {}",
        result.entries_written,
        result.bytes_written,
        output_path.display()
    );
    if !result.failures.is_empty() {
        log::warn!("{} entries were skipped", result.failures.len());
    }
    Ok(result)
}
