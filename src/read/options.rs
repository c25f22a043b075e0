//! Extraction options.

pub use crate::safety::PathSafety;

/// Options for extraction operations.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Path safety validation policy.
    pub path_safety: PathSafety,
    /// Maximum number of bytes written across all entries, if any.
    pub max_total_bytes: Option<u64>,
}

impl ExtractOptions {
    /// Creates extraction options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path safety policy.
    pub fn path_safety(mut self, policy: PathSafety) -> Self {
        self.path_safety = policy;
        self
    }

    /// Caps the total number of bytes extraction may write.
    ///
    /// Extraction fails with [`Error::CorruptArchive`] once the cap is
    /// exceeded.
    ///
    /// [`Error::CorruptArchive`]: crate::Error::CorruptArchive
    pub fn max_total_bytes(mut self, limit: u64) -> Self {
        self.max_total_bytes = Some(limit);
        self
    }
}
