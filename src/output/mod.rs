//! Run report and its renderers.
//!
//! A [`RunReport`] is assembled once per run, in traversal order, and then
//! rendered either as the line-oriented text report ([`text`]) or as JSON
//! ([`json`]).
//!
//! # Example
//!
//! ```no_run
//! use spdedup::output::{OutputFormat, RunReport};
//! # fn demo(report: &RunReport) -> std::io::Result<()> {
//! let mut stdout = std::io::stdout().lock();
//! report.write_to(&mut stdout, OutputFormat::Text)?;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod text;

use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::actions::DeletionOutcome;
use crate::duplicates::{DuplicateGroup, FinderSummary};
use crate::structural::DocumentReport;

pub use json::JsonOutput;
pub use text::TextOutput;

/// Report format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Line-oriented report
    #[default]
    Text,
    /// Structured JSON
    Json,
}

/// One duplicate group and, in commit mode, what happened to its duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// The confirmed group
    #[serde(flatten)]
    pub group: DuplicateGroup,
    /// Removal outcomes, in group order; empty in dry-run mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<DeletionOutcome>,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Scanned directory
    pub root: PathBuf,
    /// Whether mutations were applied
    pub committed: bool,
    /// Whether the structural pass ran
    pub within: bool,
    /// Traversal problems (unreadable directories and the like)
    pub scan_errors: Vec<String>,
    /// Duplicate groups, ordered by their kept member
    pub groups: Vec<GroupReport>,
    /// File-level aggregates
    pub summary: FinderSummary,
    /// Structural pass results, in traversal order
    pub documents: Vec<DocumentReport>,
    /// Whether the run stopped early on Ctrl+C
    pub interrupted: bool,
}

impl RunReport {
    /// Files removed during this run.
    #[must_use]
    pub fn deleted_files(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.deletions)
            .filter(|d| d.deleted)
            .count()
    }

    /// Render in `format` to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing (or JSON serialization) fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, format: OutputFormat) -> io::Result<()> {
        match format {
            OutputFormat::Text => TextOutput::new(self).write_to(writer),
            OutputFormat::Json => JsonOutput::new(self)
                .write_to(writer, true)
                .map_err(io::Error::other),
        }
    }
}
