//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] lists regular files under a root, optionally recursing, and
//! applies the extension filter. Entries within a directory are visited in
//! file-name order, which fixes the traversal order for a given tree. That
//! order decides which member of a duplicate group is kept.
//!
//! Symbolic links are not followed and are never reported as files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop the walk early once the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, returning matching files in traversal order together
    /// with any non-fatal errors encountered along the way.
    #[must_use]
    pub fn collect(&self) -> (Vec<FileRecord>, Vec<ScanError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        let max_depth = if self.config.recurse { usize::MAX } else { 1 };
        let walk = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walk {
            if self.is_shutdown_requested() {
                log::debug!("Walk stopped by shutdown request");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    log::warn!("Directory iteration error at {}: {}", path.display(), e);
                    errors.push(ScanError::Io {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    log::warn!("Cannot stat {}: {}", entry.path().display(), e);
                    errors.push(ScanError::Io {
                        path: entry.path().to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let record = FileRecord::new(entry.into_path(), size);
            if !self.config.accepts(&record.extension) {
                log::trace!("Filtered by extension: {}", record.path.display());
                continue;
            }
            files.push(record);
        }

        log::debug!(
            "Walk of {} found {} file(s), {} error(s)",
            self.root.display(),
            files.len(),
            errors.len()
        );
        (files, errors)
    }
}
