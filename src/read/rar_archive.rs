//! RAR decoding through the `unrar` crate.
//!
//! Headers are visited in archive order. The library hands back each file's
//! decompressed bytes in memory, which are then written under the
//! destination.

use std::fmt::Display;
use std::path::Path;

use unrar::Archive as RarArchive;

use super::destination::FilesystemDestination;
use crate::{Error, Result};

fn corrupt(archive_path: &Path, err: impl Display) -> Error {
    Error::corrupt_archive(archive_path, err.to_string())
}

/// Decodes every header of a RAR archive into the destination.
pub(super) fn extract_rar(archive_path: &Path, dest: &mut FilesystemDestination<'_>) -> Result<()> {
    let mut cursor = RarArchive::new(archive_path)
        .open_for_processing()
        .map_err(|e| corrupt(archive_path, e))?;

    let mut index = 0usize;
    while let Some(header) = cursor.read_header().map_err(|e| corrupt(archive_path, e))? {
        let raw = header.entry().filename.to_string_lossy().into_owned();
        let is_dir = header.entry().is_directory();

        cursor = if is_dir {
            dest.create_dir(index, &raw)?;
            header.skip().map_err(|e| corrupt(archive_path, e))?
        } else {
            let (data, next) = header.read().map_err(|e| corrupt(archive_path, e))?;
            dest.write_bytes(index, &raw, &data)?;
            log::trace!("Unpacked entry {} ({} bytes)", index, data.len());
            next
        };
        index += 1;
    }

    log::debug!("Visited {} RAR headers", index);
    Ok(())
}
