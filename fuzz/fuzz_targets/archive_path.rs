//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked on every accepted path:
//! - No `.` or `..` segments
//! - Not absolute
//! - No NUL bytes

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(path_str) = std::str::from_utf8(data) {
        if let Ok(path) = arcanon::ArchivePath::new(path_str) {
            let normalized = path.as_str();

            assert!(
                !normalized.split('/').any(|seg| seg == ".." || seg == "."),
                "Traversal segment accepted: {:?}",
                normalized
            );
            assert!(
                !normalized.starts_with('/'),
                "Absolute path accepted: {:?}",
                normalized
            );
            assert!(
                !normalized.contains('\0'),
                "NUL byte in normalized path: {:?}",
                normalized
            );
        }
    }

    // Entry-name normalization must never panic and never yield `.` segments.
    if let Ok(raw) = std::str::from_utf8(data) {
        let normalized = arcanon::safety::normalize_entry_name(raw);
        assert!(!normalized.split('/').any(|seg| seg == "."));
    }
});
