//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate files in a directory (dry run)
//! spdedup ~/Documents
//!
//! # Also report duplicate paragraphs/rows inside documents, recursively
//! spdedup ~/Documents --recurse --within --only-ext=.docx,.xlsx
//!
//! # Apply: delete duplicate files and rewrite documents
//! spdedup ~/Documents --within --commit
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Find and remove duplicate files, and duplicate paragraphs or rows
/// inside Office documents.
///
/// Nothing is changed unless --commit is given.
#[derive(Debug, Parser)]
#[command(name = "spdedup")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Descend into subdirectories
    #[arg(long)]
    pub recurse: bool,

    /// Only consider these extensions (comma separated, e.g. .docx,.xlsx)
    #[arg(long = "only-ext", value_name = "EXTS", value_delimiter = ',')]
    pub only_ext: Vec<String>,

    /// Apply deletions and rewrites instead of only reporting them
    #[arg(long)]
    pub commit: bool,

    /// Also deduplicate paragraphs (.docx) and rows (.xlsx) inside documents
    #[arg(long)]
    pub within: bool,

    /// Move duplicate files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of worker threads for digesting and document scans (default: 4)
    #[arg(long, value_name = "N", value_parser = parse_thread_count)]
    pub io_threads: Option<usize>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress bars and all logging except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse a positive thread count.
///
/// # Examples
///
/// ```
/// use spdedup::cli::parse_thread_count;
///
/// assert_eq!(parse_thread_count("8").unwrap(), 8);
/// assert!(parse_thread_count("0").is_err());
/// ```
pub fn parse_thread_count(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("thread count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("invalid thread count: {s}")),
    }
}
