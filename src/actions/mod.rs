//! File actions.
//!
//! Only removal is provided: permanent by default, or to the system trash
//! when configured. See [`delete`].

pub mod delete;

pub use delete::{delete_duplicates, delete_file, DeleteConfig, DeleteError, DeletionOutcome};
