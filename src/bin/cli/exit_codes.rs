//! Exit codes for the CLI tool.

use arcanon::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Completed, but some entries were skipped
pub const WARNING: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive could not be read
pub const BAD_ARCHIVE: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Input is neither ZIP nor RAR
pub const UNSUPPORTED_FORMAT: i32 = 6;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Warning,
    FatalError,
    BadArchive,
    IoError,
    UnsupportedFormat,
    UserInterrupt,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::IoError => IO_ERROR,
            Self::UnsupportedFormat => UNSUPPORTED_FORMAT,
            Self::UserInterrupt => USER_INTERRUPT,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts an arcanon error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.root_cause() {
        Error::Io(_) => ExitCode::IoError,
        Error::UnsupportedFormat { .. } => ExitCode::UnsupportedFormat,
        Error::CorruptArchive { .. } => ExitCode::BadArchive,
        Error::PathTraversal { .. } | Error::InvalidArchivePath(_) => ExitCode::FatalError,
        Error::InvalidPattern { .. } | Error::WorkDirNotEmpty { .. } => ExitCode::BadArgs,
        Error::OutputExists { .. } => ExitCode::FatalError,
        Error::Cancelled => ExitCode::UserInterrupt,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
