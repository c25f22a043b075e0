//! Fuzz target for pattern application over arbitrary file contents.
//!
//! Run with: cargo +nightly fuzz run rewrite_bytes
//!
//! Both match modes must accept any byte sequence without panicking, and
//! input without ASCII word characters must come back unchanged.

#![no_main]

use std::sync::OnceLock;

use arcanon::rewrite::{MatchMode, PatternSet, Replacements};
use libfuzzer_sys::fuzz_target;

fn pattern_sets() -> &'static [PatternSet; 2] {
    static SETS: OnceLock<[PatternSet; 2]> = OnceLock::new();
    SETS.get_or_init(|| {
        let replacements = Replacements::new("192.168.0.1", "NewComputerName", "NewUserName");
        [
            PatternSet::new(&replacements, MatchMode::Labeled).unwrap(),
            PatternSet::new(&replacements, MatchMode::Bare).unwrap(),
        ]
    })
}

fuzz_target!(|data: &[u8]| {
    for set in pattern_sets() {
        let (output, counts) = set.apply_counted(data);

        if !data.iter().any(|b| b.is_ascii_alphanumeric() || *b == b'_') {
            assert_eq!(&*output, data);
            assert_eq!(counts.total(), 0);
        }
        if counts.total() == 0 {
            assert_eq!(&*output, data);
        }
    }
});
