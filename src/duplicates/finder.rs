//! Duplicate finder: bucket, digest, confirm.
//!
//! # Overview
//!
//! 1. **Bucket** files by `(extension, size)` (see [`crate::duplicates::groups`])
//! 2. **Digest** only members of buckets with 2+ files, on a bounded pool
//! 3. **Confirm**: members of a bucket sharing a digest form a
//!    [`DuplicateGroup`], ordered by traversal so the first member is kept
//!
//! A file that cannot be digested is dropped from grouping and reported in
//! [`FinderSummary::digest_failures`]; the rest of the scan continues.
//!
//! # Example
//!
//! ```no_run
//! use spdedup::scanner::{Walker, WalkerConfig};
//! use spdedup::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let (files, _) = Walker::new(Path::new("."), WalkerConfig::default()).collect();
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let (groups, summary) = finder.find_duplicates(&files);
//!
//! println!("Found {} duplicate sets", summary.duplicate_groups);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use super::groups::{group_by_extension_and_size, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{ContentDigest, Digest, FileRecord, HashError, Hasher};
use crate::workers;

/// Configuration for the finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel digesting.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read buffer size for file digests.
    pub chunk_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("chunk_size", &self.chunk_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            chunk_size: crate::scanner::hasher::DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the digest read buffer size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A file excluded from grouping because it could not be digested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestFailure {
    /// File that failed
    pub path: PathBuf,
    /// Why it failed
    pub message: String,
}

/// Run-level aggregates of the file phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinderSummary {
    /// Files considered
    pub files_scanned: usize,
    /// Files that were digested (members of multi-file buckets)
    pub files_digested: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files that are removal candidates
    pub removable_files: usize,
    /// Bytes freed by removing every candidate
    pub reclaimable_bytes: u64,
    /// Files dropped because their digest failed
    pub digest_failures: Vec<DigestFailure>,
    /// Whether digesting stopped early on a shutdown request
    pub interrupted: bool,
}

/// Errors that stop a scan before it starts.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl FinderError {
    /// Check that `root` is an existing directory.
    ///
    /// # Errors
    ///
    /// [`FinderError::PathNotFound`] or [`FinderError::NotADirectory`].
    pub fn validate_root(root: &Path) -> Result<(), FinderError> {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        Ok(())
    }
}

/// Duplicate finder that orchestrates bucketing and digesting.
pub struct DuplicateFinder {
    config: FinderConfig,
    digester: Arc<dyn ContentDigest>,
}

impl DuplicateFinder {
    /// Create a finder that digests with BLAKE3.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_chunk_size(config.chunk_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self::with_digester(config, Arc::new(hasher))
    }

    /// Create a finder with a custom digest implementation.
    #[must_use]
    pub fn with_digester(config: FinderConfig, digester: Arc<dyn ContentDigest>) -> Self {
        Self { config, digester }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicate groups among `files` (in traversal order).
    ///
    /// Groups are returned ordered by the traversal position of their kept
    /// member; members inside a group keep traversal order.
    #[must_use]
    pub fn find_duplicates(&self, files: &[FileRecord]) -> (Vec<DuplicateGroup>, FinderSummary) {
        let mut summary = FinderSummary {
            files_scanned: files.len(),
            ..Default::default()
        };

        let (buckets, _) = group_by_extension_and_size(files);
        let candidates: Vec<usize> = buckets
            .iter()
            .flat_map(|b| b.members.iter().copied())
            .collect();

        if candidates.is_empty() {
            log::debug!("No (extension, size) collisions; nothing to digest");
            return (Vec::new(), summary);
        }

        let digests = self.digest_candidates(files, &candidates, &mut summary);

        // First-member position + group, so groups can be sorted by traversal.
        let mut ordered: Vec<(usize, DuplicateGroup)> = Vec::new();
        for bucket in &buckets {
            let mut by_digest: HashMap<Digest, Vec<usize>> = HashMap::new();
            let mut order: Vec<Digest> = Vec::new();
            for &member in &bucket.members {
                let Some(digest) = digests.get(&member) else {
                    continue;
                };
                let slot = by_digest.entry(*digest).or_default();
                if slot.is_empty() {
                    order.push(*digest);
                }
                slot.push(member);
            }

            for digest in order {
                let members = by_digest.remove(&digest).unwrap_or_default();
                if members.len() < 2 {
                    continue;
                }
                let first = members[0];
                let records = members.iter().map(|&i| files[i].clone()).collect();
                ordered.push((
                    first,
                    DuplicateGroup::new(bucket.extension.clone(), bucket.size, digest, records),
                ));
            }
        }
        ordered.sort_by_key(|(first, _)| *first);

        let groups: Vec<DuplicateGroup> = ordered.into_iter().map(|(_, g)| g).collect();
        summary.duplicate_groups = groups.len();
        summary.removable_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_bytes = groups.iter().map(DuplicateGroup::wasted_space).sum();

        log::info!(
            "Found {} duplicate set(s), {} removable file(s)",
            summary.duplicate_groups,
            summary.removable_files
        );
        (groups, summary)
    }

    /// Digest `candidates` (indices into `files`) in parallel.
    fn digest_candidates(
        &self,
        files: &[FileRecord],
        candidates: &[usize],
        summary: &mut FinderSummary,
    ) -> HashMap<usize, Digest> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("digest", candidates.len());
        }
        log::info!("Digesting {} candidate file(s)", candidates.len());

        let pool = workers::io_pool(self.config.io_threads);
        let results: Vec<(usize, Option<Result<Digest, HashError>>)> =
            workers::install(pool.as_ref(), || {
                candidates
                    .par_iter()
                    .enumerate()
                    .map(|(n, &idx)| {
                        if self.config.is_shutdown_requested() {
                            return (idx, None);
                        }
                        let file = &files[idx];
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(n + 1, file.path.to_string_lossy().as_ref());
                        }
                        (idx, Some(self.digester.digest_file(&file.path)))
                    })
                    .collect()
            });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("digest");
        }

        let mut digests = HashMap::with_capacity(results.len());
        for (idx, result) in results {
            match result {
                Some(Ok(digest)) => {
                    summary.files_digested += 1;
                    digests.insert(idx, digest);
                }
                Some(Err(HashError::Interrupted(_))) | None => {
                    summary.interrupted = true;
                }
                Some(Err(e)) => {
                    log::warn!("Failed to digest {}: {}", files[idx].path.display(), e);
                    summary.digest_failures.push(DigestFailure {
                        path: files[idx].path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        if summary.interrupted {
            log::info!("Digest phase interrupted by shutdown signal");
        }
        digests
    }
}
