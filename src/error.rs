//! Exit codes and the per-item error classification shared by both phases.

use serde::Serialize;

/// Exit codes for the spdedup application.
///
/// - 0: Success (completed normally, whether or not duplicates were found)
/// - 1: Usage or general error
/// - 2: The target is not an existing directory
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed normally.
    Success = 0,
    /// Malformed command line or an unexpected failure.
    GeneralError = 1,
    /// The root path does not exist or is not a directory.
    InvalidRoot = 2,
    /// Interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SD000",
            Self::GeneralError => "SD001",
            Self::InvalidRoot => "SD002",
            Self::Interrupted => "SD130",
        }
    }
}

/// Classification of a failed per-item operation.
///
/// A successful operation is represented by `Ok(..)`; every failure carries
/// exactly one of these tags so callers never have to guess from a bare
/// boolean why something did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An expected entry or file is absent.
    NotFound,
    /// Malformed markup or container structure.
    Format,
    /// The file or container could not be opened or read.
    Io,
    /// A rewrite was aborted before the atomic swap; the original is untouched.
    PartialWrite,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Format => write!(f, "format"),
            Self::Io => write!(f, "io"),
            Self::PartialWrite => write!(f, "partial-write"),
        }
    }
}
