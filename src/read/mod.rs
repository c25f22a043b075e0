//! Archive extraction.
//!
//! [`extract`] unpacks a ZIP or RAR archive into a directory, recreating the
//! archive's relative layout. The format is chosen from the file extension.
//!
//! # Example
//!
//! ```rust,no_run
//! use arcanon::read::{ExtractOptions, extract};
//!
//! let result = extract("logs.zip", "scratch", &ExtractOptions::default())?;
//! println!("{} files extracted", result.files_extracted);
//! # Ok::<(), arcanon::Error>(())
//! ```

mod destination;
mod options;
#[cfg(feature = "rar")]
mod rar_archive;
mod zip_archive;

pub use options::{ExtractOptions, PathSafety};

pub(crate) use zip_archive::map_zip_error;

use std::fs;
use std::io;
use std::path::Path;

use crate::format::ArchiveFormat;
use crate::{Error, Result};

use destination::FilesystemDestination;

/// Result of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractResult {
    /// Number of regular files written.
    pub files_extracted: usize,
    /// Number of directory entries created.
    pub dirs_created: usize,
    /// Total bytes written.
    pub bytes_extracted: u64,
    /// Format the archive was decoded as.
    pub format: ArchiveFormat,
}

/// Extracts every entry of `archive_path` into `dest_dir`.
///
/// `dest_dir` is created if missing. The format is detected before anything
/// is written, so an unsupported extension leaves `dest_dir` untouched.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] if the extension is not `.zip` or `.rar`
/// - [`Error::Io`] if the archive is missing or a file cannot be written
/// - [`Error::CorruptArchive`] if the archive cannot be decoded
/// - [`Error::PathTraversal`] if an entry escapes `dest_dir`
pub fn extract(
    archive_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractResult> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    let format = ArchiveFormat::from_path(archive_path)?;
    let metadata = fs::metadata(archive_path)?;
    if !metadata.is_file() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", archive_path.display()),
        )));
    }

    fs::create_dir_all(dest_dir)?;
    log::info!(
        "Opened {} archive {} ({} bytes)",
        format,
        archive_path.display(),
        metadata.len()
    );

    let mut dest = FilesystemDestination::new(archive_path, dest_dir, options.path_safety)
        .with_limit(options.max_total_bytes);

    match format {
        ArchiveFormat::Zip => zip_archive::extract_zip(archive_path, &mut dest)?,
        #[cfg(feature = "rar")]
        ArchiveFormat::Rar => rar_archive::extract_rar(archive_path, &mut dest)?,
        #[cfg(not(feature = "rar"))]
        ArchiveFormat::Rar => {
            return Err(Error::UnsupportedFormat {
                path: archive_path.display().to_string(),
            });
        }
    }

    let result = ExtractResult {
        files_extracted: dest.files_extracted,
        dirs_created: dest.dirs_created,
        bytes_extracted: dest.bytes_extracted,
        format,
    };
    log::info!(
        "Extraction complete: {} files, {} directories, {} bytes",
        result.files_extracted,
        result.dirs_created,
        result.bytes_extracted
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = ::zip::ZipWriter::new(file);
        let opts = ::zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, opts).unwrap();
            } else {
                writer.start_file(*name, opts).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip_layout() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.zip");
        write_zip(
            &archive,
            &[("a.txt", b"alpha"), ("sub/", b""), ("sub/b.txt", b"beta")],
        );

        let dest = dir.path().join("out");
        let result = extract(&archive, &dest, &ExtractOptions::default()).unwrap();

        assert_eq!(result.format, ArchiveFormat::Zip);
        assert_eq!(result.files_extracted, 2);
        assert_eq!(result.dirs_created, 1);
        assert_eq!(result.bytes_extracted, 9);
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.join("sub/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_unsupported_extension_leaves_dest_absent() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("logs.7z");
        fs::write(&archive, b"7z").unwrap();
        let dest = dir.path().join("out");

        let err = extract(&archive, &dest, &ExtractOptions::default()).unwrap_err();
        assert!(err.is_unsupported());
        assert!(!dest.exists());
    }

    #[test]
    fn test_missing_archive_is_io() {
        let dir = TempDir::new().unwrap();
        let err = extract(
            dir.path().join("absent.zip"),
            dir.path().join("out"),
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_garbage_zip_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file at all").unwrap();

        let err = extract(&archive, dir.path().join("out"), &ExtractOptions::default()).unwrap_err();
        assert!(err.is_corruption(), "unexpected error: {err}");
    }

    #[test]
    fn test_traversal_entry_rejected() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("ok.txt", b"fine"), ("../evil.txt", b"bad")]);

        let dest = dir.path().join("out");
        let err = extract(&archive, &dest, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::PathTraversal { entry_index: 1, .. }));
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_total_bytes_limit() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("big.zip");
        write_zip(&archive, &[("a.txt", &[b'x'; 64])]);

        let options = ExtractOptions::new().max_total_bytes(16);
        let err = extract(&archive, dir.path().join("out"), &options).unwrap_err();
        assert!(err.is_corruption());
    }
}
