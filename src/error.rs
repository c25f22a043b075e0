//! Error types for archive redaction.
//!
//! This module provides the [`Error`] enum which represents every failure
//! mode of the extract → rewrite → repack pipeline, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Component functions ([`extract`], [`rewrite_tree`], [`repack`]) return the
//! leaf variants directly. The orchestrator ([`pipeline::run`]) wraps them in
//! [`Error::Pipeline`] so callers know which stage failed:
//!
//! ```rust,no_run
//! use arcanon::{Error, PipelineOptions, RedactConfig};
//!
//! let config = RedactConfig::new("10.0.0.1", "HOST", "user", "logs.zip");
//! match arcanon::pipeline::run(&config, &PipelineOptions::default()) {
//!     Ok(report) => println!("Wrote {}", report.output_path.display()),
//!     Err(e) => {
//!         eprintln!("Failed during {:?}: {}", e.stage(), e.root_cause());
//!         if let Error::UnsupportedFormat { .. } = e.root_cause() {
//!             eprintln!("Only .zip and .rar archives are supported");
//!         }
//!     }
//! }
//! ```
//!
//! [`extract`]: crate::read::extract
//! [`rewrite_tree`]: crate::rewrite::rewrite_tree
//! [`repack`]: crate::write::repack
//! [`pipeline::run`]: crate::pipeline::run

use std::io;

use crate::pipeline::Stage;

/// The main error type for redaction operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Format | [`UnsupportedFormat`][Self::UnsupportedFormat], [`CorruptArchive`][Self::CorruptArchive] | Wrong or damaged input |
/// | Security | [`PathTraversal`][Self::PathTraversal], [`InvalidArchivePath`][Self::InvalidArchivePath] | Hostile entry names |
/// | Setup | [`InvalidPattern`][Self::InvalidPattern], [`OutputExists`][Self::OutputExists], [`WorkDirNotEmpty`][Self::WorkDirNotEmpty] | Configuration |
/// | Control | [`Cancelled`][Self::Cancelled] | Stop requested by the reporter |
/// | Pipeline | [`Pipeline`][Self::Pipeline] | Any of the above, tagged with its stage |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading, writing or creating a file.
    ///
    /// Common causes include a missing input archive, permission problems
    /// in the working directory, or a full disk while writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive extension is neither `.zip` nor `.rar`.
    ///
    /// Also returned for `.rar` input when the crate was built without the
    /// `rar` feature.
    #[error("Unsupported archive format: {path} (expected .zip or .rar)")]
    UnsupportedFormat {
        /// The archive path that was rejected.
        path: String,
    },

    /// The archive could not be parsed or decoded.
    ///
    /// This indicates a truncated download, a file with the wrong extension,
    /// or an archive feature this tool does not handle (such as encryption).
    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive {
        /// The archive path.
        path: String,
        /// Decoder message describing the failure.
        reason: String,
    },

    /// An entry path would escape the extraction directory.
    ///
    /// Returned under [`PathSafety::Strict`] for entries such as
    /// `../../etc/passwd` or `/etc/passwd`.
    ///
    /// [`PathSafety::Strict`]: crate::safety::PathSafety::Strict
    #[error("Path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// The index of the offending entry in archive order.
        entry_index: usize,
        /// The entry path as stored in the archive.
        path: String,
    },

    /// An archive path is invalid.
    ///
    /// Archive paths must be non-empty, relative, free of NUL bytes and free
    /// of `.` and `..` segments.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// A substitution pattern failed to compile.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Description of why the pattern is invalid.
        reason: String,
    },

    /// The output archive already exists and overwriting was not requested.
    #[error("Output archive already exists: {path}")]
    OutputExists {
        /// The output path.
        path: String,
    },

    /// A caller-supplied working directory already has content.
    ///
    /// The working directory is removed after the run, so it must be
    /// exclusive to that run.
    #[error("Working directory is not empty: {path}")]
    WorkDirNotEmpty {
        /// The working directory path.
        path: String,
    },

    /// The reporter asked the run to stop.
    ///
    /// See [`ProgressReporter::should_cancel`]. The working directory and
    /// any partial output are removed before this is returned.
    ///
    /// [`ProgressReporter::should_cancel`]: crate::progress::ProgressReporter::should_cancel
    #[error("Operation cancelled")]
    Cancelled,

    /// A pipeline stage failed.
    ///
    /// The orchestrator wraps every component error with the stage that was
    /// active when it occurred. Use [`Error::root_cause`] to reach the
    /// underlying variant.
    #[error("{stage} failed: {source}")]
    Pipeline {
        /// The stage that was running.
        stage: Stage,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the pipeline stage it occurred in.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            err @ Error::Pipeline { .. } => err,
            err => Error::Pipeline {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// Returns the stage this error occurred in, if it came from the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the innermost error, skipping any [`Error::Pipeline`] wrappers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use arcanon::Error;
    /// use arcanon::pipeline::Stage;
    ///
    /// let err = Error::UnsupportedFormat { path: "a.7z".into() }.in_stage(Stage::Extracting);
    /// assert!(matches!(err.root_cause(), Error::UnsupportedFormat { .. }));
    /// ```
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Pipeline { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns `true` if this error indicates a hostile or malformed entry path.
    pub fn is_security_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::PathTraversal { .. } | Error::InvalidArchivePath(_)
        )
    }

    /// Returns `true` if the input archive is damaged or unreadable.
    pub fn is_corruption(&self) -> bool {
        matches!(self.root_cause(), Error::CorruptArchive { .. })
    }

    /// Returns `true` if the run was stopped on request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Error::Cancelled)
    }

    /// Returns `true` if the input format is not handled.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), Error::UnsupportedFormat { .. })
    }

    /// Creates a CorruptArchive error.
    pub fn corrupt_archive(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        Error::CorruptArchive {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for redaction operations.
pub type Result<T> = std::result::Result<T, Error>;
