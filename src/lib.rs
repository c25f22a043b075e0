//! # arcanon
//!
//! Anonymize IP addresses, computer names and user names inside ZIP and RAR
//! archives.
//!
//! A run extracts one archive into a private working directory, rewrites
//! every extracted file with three ordered substitutions (IP, then computer
//! name, then user name) and repacks the tree as `new_<name>` in ZIP format.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arcanon::{PipelineOptions, RedactConfig, Result};
//!
//! fn main() -> Result<()> {
//!     let config = RedactConfig::new("192.168.0.1", "NewComputerName", "NewUserName", "logs.zip");
//!     let report = arcanon::pipeline::run(&config, &PipelineOptions::default())?;
//!
//!     println!(
//!         "Wrote {} ({} of {} files changed)",
//!         report.output_path.display(),
//!         report.rewrite.files_changed,
//!         report.rewrite.files_scanned
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Using the Stages Directly
//!
//! Each stage is usable on its own:
//!
//! ```rust,no_run
//! use arcanon::progress::NoProgress;
//! use arcanon::read::{ExtractOptions, extract};
//! use arcanon::rewrite::{MatchMode, PatternSet, Replacements, RewriteOptions, rewrite_tree};
//! use arcanon::write::{RepackOptions, repack};
//!
//! # fn main() -> arcanon::Result<()> {
//! extract("logs.rar", "scratch", &ExtractOptions::default())?;
//!
//! let replacements = Replacements::new("10.0.0.1", "HOST", "user");
//! let patterns = PatternSet::new(&replacements, MatchMode::Labeled)?;
//! rewrite_tree("scratch", &patterns, &RewriteOptions::default(), &mut NoProgress)?;
//!
//! repack("scratch", "clean.zip", &RepackOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Match Modes
//!
//! [`MatchMode::Labeled`] (the default) only replaces names that appear as
//! the value of a label such as `Computer: X` or `user=Y`. The whole value
//! is replaced, up to the next whitespace or delimiter.
//! [`MatchMode::Bare`] treats every 1-15 character token as a name; the
//! computer-name pass then rewrites every word in every file.
//!
//! Rewriting is not idempotent in general: a second run can match text that
//! the first run inserted.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `rar` | Yes | RAR input through the `unrar` library |
//! | `async` | No | Background execution with Tokio |
//! | `cli` | No | The `arcanon` command-line tool |
//!
//! ## Safety
//!
//! - **Path traversal protection**: entry names that would escape the
//!   working directory are rejected ([`safety::PathSafety::Strict`])
//! - **Atomic rewrites**: each file is replaced through a temporary file
//! - **Cleanup**: the working directory is removed on success and failure
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade. Debug records carry match
//! counts only. File contents before and after substitution are logged at
//! trace level on the `arcanon::content` target.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod progress;
pub mod read;
pub mod rewrite;
pub mod safety;
pub mod write;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_pipeline;

pub use archive_path::ArchivePath;
pub use error::{Error, Result};
pub use format::ArchiveFormat;

pub use pipeline::{PipelineOptions, PipelineReport, RedactConfig, Stage};
pub use read::{ExtractOptions, ExtractResult};
pub use rewrite::{MatchCounts, MatchMode, PatternSet, Replacements, RewriteOptions, RewriteResult};
pub use write::{EntryFailurePolicy, RepackOptions, RepackResult};

pub use progress::{
    AtomicProgress, NoProgress, ProgressReporter, ProgressState, StatisticsProgress, progress_fn,
};

#[cfg(feature = "async")]
pub use async_pipeline::{ChannelProgressReporter, ProgressEvent};
