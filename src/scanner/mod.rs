//! Scanner module for directory traversal and content digests.
//!
//! This module provides functionality for:
//! - Directory walking with recursion and extension filtering
//! - Content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 digests (streaming for files, one-shot for buffers)
//!
//! # Example
//!
//! ```no_run
//! use spdedup::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     recurse: true,
//!     allowed_extensions: vec![".docx".to_string()],
//! };
//!
//! let (files, errors) = Walker::new(Path::new("."), config).collect();
//! for file in &files {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! for e in &errors {
//!     eprintln!("Warning: {}", e);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

// Re-export main types
pub use hasher::{digest_bytes, digest_to_hex, ContentDigest, Digest, Hasher};
pub use walker::Walker;

/// A discovered file, as produced by the walker.
///
/// The digest is not stored here: it is computed only when the file shares
/// its `(extension, size)` bucket with at least one other file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Lowercase extension with a leading dot, or empty if none
    pub extension: String,
}

impl FileRecord {
    /// Create a record, deriving the normalized extension from `path`.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = normalize_extension_of(&path);
        Self {
            path,
            size,
            extension,
        }
    }
}

/// Lowercase extension of `path` with a leading dot (`""` when absent).
#[must_use]
pub fn normalize_extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Normalize a user-supplied extension filter entry: trims, lowercases and
/// adds the leading dot. Returns `None` for blank input.
#[must_use]
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{lower}"))
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories.
    pub recurse: bool,

    /// Normalized extensions to keep (e.g. `.docx`). Empty keeps everything.
    pub allowed_extensions: Vec<String>,
}

impl WalkerConfig {
    /// Create a configuration, normalizing the extension filter.
    #[must_use]
    pub fn new(recurse: bool, allowed_extensions: &[String]) -> Self {
        Self {
            recurse,
            allowed_extensions: allowed_extensions
                .iter()
                .filter_map(|e| normalize_extension(e))
                .collect(),
        }
    }

    /// Whether a record with this normalized extension passes the filter.
    #[must_use]
    pub fn accepts(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty() || self.allowed_extensions.iter().any(|e| e == extension)
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Description of the underlying failure
        message: String,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Interrupted while hashing: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an open failure.
    pub(crate) fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}
