//! Whole-file duplicate detection.
//!
//! - `(extension, size)` bucketing ([`groups`])
//! - Digest confirmation on a bounded pool ([`finder`])
//! - Duplicate group roles: the first member in traversal order is kept

pub mod finder;
pub mod groups;

pub use finder::{DigestFailure, DuplicateFinder, FinderConfig, FinderError, FinderSummary};
pub use groups::{group_by_extension_and_size, DuplicateGroup, GroupingStats, SizeBucket};
