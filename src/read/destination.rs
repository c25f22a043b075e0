//! Filesystem destination shared by the ZIP and RAR decoders.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::safety::{PathSafety, normalize_entry_name, resolve_entry_path};
use crate::{Error, Result};

/// Writes decoded entries under an extraction directory and keeps counts.
pub(crate) struct FilesystemDestination<'a> {
    archive_path: &'a Path,
    root: &'a Path,
    policy: PathSafety,
    max_total_bytes: Option<u64>,
    pub(crate) files_extracted: usize,
    pub(crate) dirs_created: usize,
    pub(crate) bytes_extracted: u64,
}

impl<'a> FilesystemDestination<'a> {
    pub(crate) fn new(archive_path: &'a Path, root: &'a Path, policy: PathSafety) -> Self {
        Self {
            archive_path,
            root,
            policy,
            max_total_bytes: None,
            files_extracted: 0,
            dirs_created: 0,
            bytes_extracted: 0,
        }
    }

    /// Caps the total number of bytes written across all entries.
    pub(crate) fn with_limit(mut self, max_total_bytes: Option<u64>) -> Self {
        self.max_total_bytes = max_total_bytes;
        self
    }

    /// Creates the directory for a directory entry, including parents.
    ///
    /// Entries that name the extraction root itself (such as `./`) are
    /// ignored.
    pub(crate) fn create_dir(&mut self, index: usize, raw_name: &str) -> Result<()> {
        if normalize_entry_name(raw_name).is_empty() {
            log::debug!("Ignoring root directory entry {}", index);
            return Ok(());
        }
        let target = resolve_entry_path(raw_name, self.root, self.policy, index)?;
        fs::create_dir_all(&target)?;
        self.dirs_created += 1;
        Ok(())
    }

    /// Streams a file entry to disk, creating parent directories as needed.
    ///
    /// Read errors that signal malformed data are reported as
    /// [`Error::CorruptArchive`].
    pub(crate) fn write_file(
        &mut self,
        index: usize,
        raw_name: &str,
        reader: &mut dyn Read,
    ) -> Result<u64> {
        let target = self.prepare_file(index, raw_name)?;
        let mut writer = BufWriter::new(File::create(&target)?);
        let copied = match self.remaining() {
            // One byte past the cap is enough to detect the overrun.
            Some(remaining) => io::copy(&mut reader.take(remaining.saturating_add(1)), &mut writer),
            None => io::copy(reader, &mut writer),
        };
        let written = copied.map_err(|e| self.map_copy_error(e))?;
        writer.flush()?;
        self.record_file(written)?;
        Ok(written)
    }

    /// Writes an already decoded file entry to disk.
    #[cfg_attr(not(feature = "rar"), allow(dead_code))]
    pub(crate) fn write_bytes(&mut self, index: usize, raw_name: &str, data: &[u8]) -> Result<u64> {
        let written = data.len() as u64;
        if self.remaining().is_some_and(|remaining| written > remaining) {
            return Err(self.limit_exceeded());
        }
        let target = self.prepare_file(index, raw_name)?;
        fs::write(&target, data)?;
        self.record_file(written)?;
        Ok(written)
    }

    fn prepare_file(&self, index: usize, raw_name: &str) -> Result<PathBuf> {
        let target = resolve_entry_path(raw_name, self.root, self.policy, index)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(target)
    }

    fn remaining(&self) -> Option<u64> {
        self.max_total_bytes
            .map(|limit| limit.saturating_sub(self.bytes_extracted))
    }

    fn record_file(&mut self, bytes: u64) -> Result<()> {
        self.files_extracted += 1;
        self.bytes_extracted += bytes;
        match self.max_total_bytes {
            Some(limit) if self.bytes_extracted > limit => Err(self.limit_exceeded()),
            _ => Ok(()),
        }
    }

    fn limit_exceeded(&self) -> Error {
        Error::corrupt_archive(
            self.archive_path,
            format!(
                "extracted size exceeds limit of {} bytes",
                self.max_total_bytes.unwrap_or_default()
            ),
        )
    }

    fn map_copy_error(&self, err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                Error::corrupt_archive(self.archive_path, err.to_string())
            }
            _ => Error::Io(err),
        }
    }
}
