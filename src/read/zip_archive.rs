//! ZIP decoding through the `zip` crate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ::zip::ZipArchive;
use ::zip::result::ZipError;

use super::destination::FilesystemDestination;
use crate::{Error, Result};

/// Maps a `zip` crate error to the crate taxonomy.
pub(crate) fn map_zip_error(archive_path: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::Io(e),
        other => Error::corrupt_archive(archive_path, other.to_string()),
    }
}

/// Inflates every entry of a ZIP archive into the destination.
pub(super) fn extract_zip(archive_path: &Path, dest: &mut FilesystemDestination<'_>) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| map_zip_error(archive_path, e))?;
    log::debug!("Central directory lists {} entries", archive.len());

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| map_zip_error(archive_path, e))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            dest.create_dir(index, &name)?;
        } else {
            let written = dest.write_file(index, &name, &mut entry)?;
            log::trace!("Inflated entry {} ({} bytes)", index, written);
        }
    }
    Ok(())
}
