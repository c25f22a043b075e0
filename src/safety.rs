//! Path safety for extraction.
//!
//! Entry names come straight from archive headers and are attacker
//! controlled. This module maps a raw entry name to a location under the
//! extraction directory according to a [`PathSafety`] policy.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Policy for validating extraction paths.
///
/// The default is `Strict`, which blocks any entry that would land outside
/// the destination directory.
///
/// # Examples
///
/// ```rust
/// use arcanon::safety::PathSafety;
///
/// let policy = PathSafety::default();
/// assert_eq!(policy, PathSafety::Strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathSafety {
    /// Strict validation: block any potential path traversal.
    ///
    /// - Rejects paths containing `..` components
    /// - Rejects absolute paths and drive-letter prefixes
    /// - Verifies that the resolved path stays within the destination
    ///   directory after following existing symlinks
    #[default]
    Strict,
    /// Lexical checks only: `..` and absolute paths are rejected, but
    /// symlinks already present in the destination are not resolved.
    Relaxed,
    /// Disables all path validation (DANGEROUS).
    ///
    /// The trimmed header path is joined onto the destination verbatim, so
    /// `../x` escapes the directory and an absolute path replaces it
    /// entirely. Only use this for archives you produced yourself.
    Disabled,
}

/// Normalizes a raw entry name into `/`-separated relative form.
///
/// Surrounding whitespace is trimmed, `\` is treated as a separator, and
/// empty or `.` segments are dropped. `..` segments and absolute prefixes
/// are kept so that [`resolve_entry_path`] can reject them.
///
/// # Examples
///
/// ```rust
/// use arcanon::safety::normalize_entry_name;
///
/// assert_eq!(normalize_entry_name("  dir\\sub/./file.txt \n"), "dir/sub/file.txt");
/// assert_eq!(normalize_entry_name("logs/"), "logs");
/// ```
pub fn normalize_entry_name(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let leading_slash = unified.starts_with('/');
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let joined = segments.join("/");
    if leading_slash {
        format!("/{}", joined)
    } else {
        joined
    }
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Resolves an archive entry name to its extraction target under `dest_root`.
///
/// # Arguments
///
/// * `raw` - The entry name as stored in the archive header
/// * `dest_root` - The extraction directory
/// * `policy` - The path safety policy to enforce
/// * `entry_index` - The index of the entry (for error reporting)
///
/// # Errors
///
/// Returns [`Error::PathTraversal`] when the entry would escape `dest_root`,
/// [`Error::InvalidArchivePath`] when nothing is left of the name after
/// normalization, and [`Error::Io`] if `dest_root` cannot be canonicalized
/// under [`PathSafety::Strict`].
pub fn resolve_entry_path(
    raw: &str,
    dest_root: &Path,
    policy: PathSafety,
    entry_index: usize,
) -> Result<PathBuf> {
    if policy == PathSafety::Disabled {
        return Ok(dest_root.join(raw.trim()));
    }

    let traversal = || Error::PathTraversal {
        entry_index,
        path: raw.to_string(),
    };

    let name = normalize_entry_name(raw);
    if name.starts_with('/') || has_drive_prefix(&name) {
        return Err(traversal());
    }
    if name.split('/').any(|segment| segment == "..") {
        return Err(traversal());
    }
    if name.is_empty() {
        return Err(Error::InvalidArchivePath(format!(
            "entry {} has an empty name",
            entry_index
        )));
    }

    let full_path = name
        .split('/')
        .fold(dest_root.to_path_buf(), |acc, segment| acc.join(segment));

    if policy == PathSafety::Strict && !stays_within(&full_path, dest_root)? {
        return Err(traversal());
    }

    Ok(full_path)
}

/// Checks that the deepest existing ancestor of `path` canonicalizes to a
/// location inside `root`.
fn stays_within(path: &Path, root: &Path) -> Result<bool> {
    let canonical_root = root.canonicalize()?;
    let mut ancestor = path;
    while ancestor.symlink_metadata().is_err() {
        match ancestor.parent() {
            Some(parent) => ancestor = parent,
            None => return Ok(true),
        }
    }
    let canonical = ancestor.canonicalize()?;
    Ok(canonical.starts_with(&canonical_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_trims_and_unifies() {
        assert_eq!(normalize_entry_name(" a\\b.txt "), "a/b.txt");
        assert_eq!(normalize_entry_name("./a//b/"), "a/b");
        assert_eq!(normalize_entry_name("/etc/passwd"), "/etc/passwd");
        assert_eq!(normalize_entry_name("./"), "");
    }

    #[test]
    fn test_strict_normal_path() {
        let dest = TempDir::new().unwrap();
        let result = resolve_entry_path("foo/bar.txt", dest.path(), PathSafety::Strict, 0).unwrap();
        assert_eq!(result, dest.path().join("foo").join("bar.txt"));
    }

    #[test]
    fn test_strict_trims_header_whitespace() {
        let dest = TempDir::new().unwrap();
        let result = resolve_entry_path("  notes.txt\t", dest.path(), PathSafety::Strict, 0).unwrap();
        assert_eq!(result, dest.path().join("notes.txt"));
    }

    #[test]
    fn test_strict_rejects_traversal() {
        let dest = TempDir::new().unwrap();
        let err = resolve_entry_path("../../etc/passwd", dest.path(), PathSafety::Strict, 4)
            .unwrap_err();
        assert!(matches!(err, Error::PathTraversal { entry_index: 4, .. }));
    }

    #[test]
    fn test_strict_rejects_backslash_traversal() {
        let dest = TempDir::new().unwrap();
        let err = resolve_entry_path("dir\\..\\..\\x", dest.path(), PathSafety::Strict, 0)
            .unwrap_err();
        assert!(err.is_security_error());
    }

    #[test]
    fn test_strict_rejects_absolute() {
        let dest = TempDir::new().unwrap();
        assert!(resolve_entry_path("/etc/passwd", dest.path(), PathSafety::Strict, 0).is_err());
        assert!(resolve_entry_path("C:\\Windows\\x", dest.path(), PathSafety::Strict, 0).is_err());
    }

    #[test]
    fn test_relaxed_rejects_traversal() {
        let dest = TempDir::new().unwrap();
        let err = resolve_entry_path("a/../../b", dest.path(), PathSafety::Relaxed, 1).unwrap_err();
        assert!(matches!(err, Error::PathTraversal { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let dest = TempDir::new().unwrap();
        let err = resolve_entry_path(" ./ ", dest.path(), PathSafety::Strict, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArchivePath(_)));
    }

    #[test]
    fn test_disabled_joins_verbatim() {
        let dest = TempDir::new().unwrap();
        let result =
            resolve_entry_path(" ../escape.txt ", dest.path(), PathSafety::Disabled, 0).unwrap();
        assert_eq!(result, dest.path().join("../escape.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_strict_rejects_symlink_escape() {
        let dest = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dest.path().join("link")).unwrap();

        let err = resolve_entry_path("link/file.txt", dest.path(), PathSafety::Strict, 0)
            .unwrap_err();
        assert!(matches!(err, Error::PathTraversal { .. }));

        let relaxed = resolve_entry_path("link/file.txt", dest.path(), PathSafety::Relaxed, 0);
        assert!(relaxed.is_ok());
    }
}
