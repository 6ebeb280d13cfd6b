//! Duplicate groups and `(extension, size)` bucketing.
//!
//! # Overview
//!
//! Bucketing is the cheap first filter: files with a different extension or
//! size can never be in the same group, so only buckets with two or more
//! members are worth digesting. Buckets refer to files by their index in the
//! traversal-ordered input, which lets later phases restore traversal order.
//!
//! # Example
//!
//! ```
//! use spdedup::scanner::FileRecord;
//! use spdedup::duplicates::group_by_extension_and_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/a.txt"), 1),
//!     FileRecord::new(PathBuf::from("/b.txt"), 1),
//!     FileRecord::new(PathBuf::from("/c.txt"), 2),
//!     FileRecord::new(PathBuf::from("/d.md"), 1),
//! ];
//!
//! let (buckets, stats) = group_by_extension_and_size(&files);
//!
//! assert_eq!(stats.total_files, 4);
//! assert_eq!(stats.candidate_files, 2);
//! assert_eq!(buckets.len(), 1);
//! assert_eq!(buckets[0].members, vec![0, 1]);
//! ```

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::scanner::{digest_to_hex, Digest, FileRecord};

/// Files sharing an extension and size, as indices into the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// Normalized extension shared by all members
    pub extension: String,
    /// Size in bytes shared by all members
    pub size: u64,
    /// Indices of members, ascending (traversal order)
    pub members: Vec<usize>,
}

/// Statistics from the bucketing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files considered
    pub total_files: usize,
    /// Number of distinct `(extension, size)` keys
    pub unique_keys: usize,
    /// Files in buckets with 2+ members (these get digested)
    pub candidate_files: usize,
    /// Files eliminated without reading their content
    pub eliminated_unique: usize,
}

/// Bucket `files` by `(extension, size)`, keeping only buckets with at least
/// two members. Buckets are returned in order of their first member.
#[must_use]
pub fn group_by_extension_and_size(files: &[FileRecord]) -> (Vec<SizeBucket>, GroupingStats) {
    let mut index: HashMap<(&str, u64), usize> = HashMap::new();
    let mut buckets: Vec<SizeBucket> = Vec::new();

    for (position, file) in files.iter().enumerate() {
        let key = (file.extension.as_str(), file.size);
        match index.get(&key) {
            Some(&slot) => buckets[slot].members.push(position),
            None => {
                index.insert(key, buckets.len());
                buckets.push(SizeBucket {
                    extension: file.extension.clone(),
                    size: file.size,
                    members: vec![position],
                });
            }
        }
    }

    let unique_keys = buckets.len();
    buckets.retain(|b| b.members.len() > 1);
    let candidate_files: usize = buckets.iter().map(|b| b.members.len()).sum();

    let stats = GroupingStats {
        total_files: files.len(),
        unique_keys,
        candidate_files,
        eliminated_unique: files.len() - candidate_files,
    };

    log::debug!(
        "Bucketing: {} files, {} keys, {} candidates",
        stats.total_files,
        stats.unique_keys,
        stats.candidate_files
    );
    (buckets, stats)
}

/// A confirmed set of identical files.
///
/// The first member is the one kept; every later member is a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Normalized extension shared by all members
    pub extension: String,
    /// Size in bytes shared by all members
    pub size: u64,
    /// Content digest shared by all members
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Digest,
    /// Members in traversal order
    pub files: Vec<FileRecord>,
}

fn serialize_digest<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&digest_to_hex(digest))
}

impl DuplicateGroup {
    /// Create a group. `files` must be in traversal order.
    #[must_use]
    pub fn new(extension: String, size: u64, digest: Digest, files: Vec<FileRecord>) -> Self {
        debug_assert!(files.len() > 1, "a duplicate group needs two members");
        Self {
            extension,
            size,
            digest,
            files,
        }
    }

    /// The retained member.
    #[must_use]
    pub fn keep(&self) -> Option<&FileRecord> {
        self.files.first()
    }

    /// Removal candidates (every member after the first).
    #[must_use]
    pub fn duplicates(&self) -> &[FileRecord] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of removable copies.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes freed by removing every duplicate.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }
}
