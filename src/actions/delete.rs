//! Removal of duplicate files.
//!
//! # Overview
//!
//! Given a confirmed [`DuplicateGroup`], every member except the kept one is
//! removed, either permanently (the default) or by moving it to the system
//! trash. A failure on one file is recorded and the rest of the group is
//! still processed. The kept member is never touched.
//!
//! Before a file is removed its size is checked against the size seen during
//! the scan; a file that changed in the meantime is left alone.
//!
//! # Example
//!
//! ```no_run
//! use spdedup::actions::{delete_duplicates, DeleteConfig};
//! # fn demo(group: &spdedup::duplicates::DuplicateGroup) {
//! for outcome in delete_duplicates(group, &DeleteConfig::default()) {
//!     if let Some(error) = &outcome.error {
//!         eprintln!("{}: {}", outcome.path.display(), error);
//!     }
//! }
//! # }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::scanner::FileRecord;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size differs from the one seen during the scan.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteConfig {
    /// Move files to the system trash instead of removing them.
    pub trash: bool,
}

/// What happened to one removal candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// The candidate
    pub path: PathBuf,
    /// Whether the file is gone
    pub deleted: bool,
    /// Why it is not gone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Remove one scanned file, refusing if its size changed since the scan.
///
/// # Errors
///
/// - `NotFound` if the file no longer exists
/// - `Modified` if its size differs from `record.size`
/// - `PermissionDenied`, `TrashFailed` or `Io` if the removal itself fails
pub fn delete_file(record: &FileRecord, config: &DeleteConfig) -> Result<(), DeleteError> {
    let path = record.path.as_path();
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.len() != record.size {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            path.display(),
            record.size,
            metadata.len()
        );
        return Err(DeleteError::Modified(path.to_path_buf()));
    }

    if config.trash {
        trash::delete(path).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), record.size);
    } else {
        fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
        log::info!("Deleted: {} ({} bytes)", path.display(), record.size);
    }
    Ok(())
}

/// Remove every duplicate of `group`, keeping its first member.
///
/// Outcomes are returned in group order.
#[must_use]
pub fn delete_duplicates(group: &DuplicateGroup, config: &DeleteConfig) -> Vec<DeletionOutcome> {
    group
        .duplicates()
        .iter()
        .map(|record| match delete_file(record, config) {
            Ok(()) => DeletionOutcome {
                path: record.path.clone(),
                deleted: true,
                error: None,
            },
            Err(e) => {
                log::error!("{}", e);
                DeletionOutcome {
                    path: record.path.clone(),
                    deleted: false,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}
