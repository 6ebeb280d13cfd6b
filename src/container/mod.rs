//! Archive container access (the ZIP packaging used by Office documents).
//!
//! # Overview
//!
//! [`ContainerStore`] exposes three operations over a container path:
//! - [`ContainerStore::list_entries`]: entry names in archive order
//! - [`ContainerStore::read_entry`]: decompressed bytes of one entry
//! - [`ContainerStore::replace_entry`]: transactional rewrite of one entry
//!   (see [`rewrite`])
//!
//! Every failure is a [`ContainerError`], whose [`ContainerError::kind`] tag
//! distinguishes a missing entry from a malformed or unreadable container.
//! In particular an unreadable container is an error, never an empty list.

pub mod rewrite;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ErrorKind;

/// Errors returned by container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The named entry does not exist in the container.
    #[error("entry '{entry}' not found in {path}")]
    NotFound {
        /// Container path
        path: PathBuf,
        /// Entry that was requested
        entry: String,
    },

    /// The container is not a readable archive.
    #[error("malformed container {path}: {message}")]
    Format {
        /// Container path
        path: PathBuf,
        /// Description from the archive reader
        message: String,
    },

    /// The container could not be opened or read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Container path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A rewrite was abandoned before the swap; the original is unchanged.
    #[error("rewrite of {path} aborted: {message}")]
    PartialWrite {
        /// Container path
        path: PathBuf,
        /// What failed while writing the replacement
        message: String,
    },
}

impl ContainerError {
    /// The classification tag for this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Format { .. } => ErrorKind::Format,
            Self::Io { .. } => ErrorKind::Io,
            Self::PartialWrite { .. } => ErrorKind::PartialWrite,
        }
    }

    /// Container path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::Format { path, .. }
            | Self::Io { path, .. }
            | Self::PartialWrite { path, .. } => path,
        }
    }

    pub(crate) fn from_zip(path: &Path, e: ZipError) -> Self {
        match e {
            ZipError::Io(source) => Self::Io {
                path: path.to_path_buf(),
                source,
            },
            other => Self::Format {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub(crate) type Archive = ZipArchive<BufReader<File>>;

/// Stateless handle for container operations.
///
/// Callers must not run two operations against the same container path at
/// once; a rewrite replaces the file underneath any concurrent reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerStore;

impl ContainerStore {
    /// Create a store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn open(&self, container: &Path) -> Result<Archive, ContainerError> {
        let file = File::open(container).map_err(|e| ContainerError::from_io(container, e))?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| ContainerError::from_zip(container, e))
    }

    /// Entry names in archive order.
    ///
    /// # Errors
    ///
    /// [`ContainerError::Io`] or [`ContainerError::Format`] if the container
    /// cannot be opened; an empty `Ok` always means a genuinely empty archive.
    pub fn list_entries(&self, container: &Path) -> Result<Vec<String>, ContainerError> {
        let mut archive = self.open(container)?;
        entry_names(&mut archive, container)
    }

    /// Read and decompress a single entry.
    ///
    /// # Errors
    ///
    /// [`ContainerError::NotFound`] if the entry is absent, otherwise
    /// [`ContainerError::Io`]/[`ContainerError::Format`] on open or read
    /// failure.
    pub fn read_entry(&self, container: &Path, entry: &str) -> Result<Vec<u8>, ContainerError> {
        let mut archive = self.open(container)?;
        let mut file = match archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(ContainerError::NotFound {
                    path: container.to_path_buf(),
                    entry: entry.to_string(),
                })
            }
            Err(e) => return Err(ContainerError::from_zip(container, e)),
        };

        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)
            .map_err(|e| ContainerError::from_io(container, e))?;
        log::trace!(
            "Read {} byte(s) from {}!{}",
            bytes.len(),
            container.display(),
            entry
        );
        Ok(bytes)
    }
}

pub(crate) fn entry_names(
    archive: &mut Archive,
    container: &Path,
) -> Result<Vec<String>, ContainerError> {
    (0..archive.len())
        .map(|index| {
            archive
                .by_index_raw(index)
                .map(|file| file.name().to_string())
                .map_err(|e| ContainerError::from_zip(container, e))
        })
        .collect()
}
