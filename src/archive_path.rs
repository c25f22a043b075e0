//! Validated entry names for the output ZIP archive.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path};

/// Maximum length for archive paths (in bytes).
///
/// Well above any file system path limit, so only hostile input hits it.
const MAX_PATH_LENGTH: usize = 32768;

/// A validated, `/`-separated relative entry name.
///
/// `ArchivePath` guarantees that:
/// - No NUL bytes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use arcanon::ArchivePath;
///
/// let path = ArchivePath::new("logs/app.log").unwrap();
/// assert_eq!(path.as_str(), "logs/app.log");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path is empty, too long,
    /// absolute, contains NUL bytes, empty segments, or `.`/`..` segments.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds an entry name from a file system path relative to the
    /// directory being archived.
    ///
    /// Platform separators are joined with `/`. Components that are not
    /// valid UTF-8 are rejected since ZIP entry names are stored as UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use arcanon::ArchivePath;
    ///
    /// let path = ArchivePath::from_relative(Path::new("dir").join("a.txt").as_path()).unwrap();
    /// assert_eq!(path.as_str(), "dir/a.txt");
    /// ```
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::InvalidArchivePath(format!(
                            "non-UTF-8 component in {}",
                            path.display()
                        ))
                    })?;
                    segments.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidArchivePath(
                        "absolute path not allowed".into(),
                    ));
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => {
                    return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
                }
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_nested_path() {
        let path = ArchivePath::new("dir/file.txt").unwrap();
        assert_eq!(path.as_str(), "dir/file.txt");
        assert_eq!(path.file_name(), "file.txt");
    }

    #[test]
    fn test_valid_unicode() {
        let path = ArchivePath::new("日本語/файл.txt").unwrap();
        assert_eq!(path.components().collect::<Vec<_>>(), vec!["日本語", "файл.txt"]);
    }

    #[test]
    fn test_invalid_empty() {
        let err = ArchivePath::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidArchivePath(_)));
    }

    #[test]
    fn test_invalid_nul_byte() {
        let err = ArchivePath::new("file\0.txt").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_invalid_absolute_path() {
        let err = ArchivePath::new("/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_invalid_empty_segment() {
        let err = ArchivePath::new("a//b").unwrap_err();
        assert!(err.to_string().contains("empty segment"));
    }

    #[test]
    fn test_invalid_trailing_slash() {
        let err = ArchivePath::new("dir/").unwrap_err();
        assert!(err.to_string().contains("trailing slash"));
    }

    #[test]
    fn test_invalid_dot_segments() {
        assert!(ArchivePath::new("./file").is_err());
        assert!(ArchivePath::new("a/./b").is_err());
        let err = ArchivePath::new("a/../b").unwrap_err();
        assert!(err.to_string().contains(".."));
    }

    #[test]
    fn test_invalid_too_long() {
        let long = "a".repeat(MAX_PATH_LENGTH + 1);
        let err = ArchivePath::new(&long).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_from_relative_joins_with_slash() {
        let rel: PathBuf = ["logs", "2024", "app.log"].iter().collect();
        let path = ArchivePath::from_relative(&rel).unwrap();
        assert_eq!(path.as_str(), "logs/2024/app.log");
    }

    #[test]
    fn test_from_relative_skips_cur_dir() {
        let path = ArchivePath::from_relative(Path::new("./a.txt")).unwrap();
        assert_eq!(path.as_str(), "a.txt");
    }

    #[test]
    fn test_from_relative_rejects_parent() {
        let err = ArchivePath::from_relative(Path::new("../a.txt")).unwrap_err();
        assert!(matches!(err, Error::InvalidArchivePath(_)));
    }

    #[test]
    fn test_from_relative_rejects_absolute() {
        let err = ArchivePath::from_relative(Path::new("/tmp/a.txt")).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_from_relative_rejects_empty() {
        assert!(ArchivePath::from_relative(Path::new("")).is_err());
    }

    #[test]
    fn test_try_from_str() {
        let path: ArchivePath = "a/b.txt".try_into().unwrap();
        assert_eq!(path.to_string(), "a/b.txt");
    }
}
