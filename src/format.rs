//! Archive format dispatch.
//!
//! The input format is chosen from the file extension alone, before any
//! byte of the archive is read.

use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Input archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP archive.
    Zip,
    /// RAR archive (v4 or v5).
    Rar,
}

impl ArchiveFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Rar => "rar",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Rar => "RAR",
        }
    }

    /// Returns whether this build can extract the format.
    ///
    /// RAR depends on the `rar` feature.
    pub fn is_supported(&self) -> bool {
        match self {
            ArchiveFormat::Zip => true,
            ArchiveFormat::Rar => cfg!(feature = "rar"),
        }
    }

    /// Maps an extension (without the dot) to a format, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use arcanon::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_extension("ZIP"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::from_extension("rar"), Some(ArchiveFormat::Rar));
    /// assert_eq!(ArchiveFormat::from_extension("7z"), None);
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.eq_ignore_ascii_case("zip") {
            Some(ArchiveFormat::Zip)
        } else if extension.eq_ignore_ascii_case("rar") {
            Some(ArchiveFormat::Rar)
        } else {
            None
        }
    }

    /// Detects the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension is missing or
    /// unknown, or if the format was compiled out.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unsupported = || Error::UnsupportedFormat {
            path: path.display().to_string(),
        };

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(unsupported)?;

        if !format.is_supported() {
            log::warn!(
                "{} support is not compiled in; rebuild with the `rar` feature",
                format.name()
            );
            return Err(unsupported());
        }
        Ok(format)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
