//! spdedup - duplicate file and duplicate content remover
//!
//! A run has two phases over one directory:
//!
//! 1. **Files**: files with the same extension, size and BLAKE3 digest form a
//!    duplicate set; the first one in traversal order is kept and, with
//!    `--commit`, the others are deleted.
//! 2. **Within documents** (`--within`): repeated paragraphs in `.docx` and
//!    repeated rows in `.xlsx` are removed, keeping the first occurrence, and
//!    the container is rewritten atomically.
//!
//! Without `--commit` nothing on disk is modified.

pub mod actions;
pub mod cli;
pub mod config;
pub mod container;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod structural;
pub mod workers;

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{delete_duplicates, DeleteConfig};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::output::{GroupReport, OutputFormat, RunReport};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{Walker, WalkerConfig};
use crate::signal::ShutdownHandler;
use crate::structural::{PipelineConfig, StructuralDedup};

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory to scan
    pub root: PathBuf,
    /// Descend into subdirectories
    pub recurse: bool,
    /// Extension filter; empty means every file
    pub only_ext: Vec<String>,
    /// Apply deletions and rewrites
    pub commit: bool,
    /// Run the within-document phase
    pub within: bool,
    /// Move deleted files to the trash
    pub trash: bool,
    /// Worker threads
    pub io_threads: usize,
    /// Digest read buffer size
    pub chunk_size: usize,
    /// Report format
    pub format: OutputFormat,
}

impl RunOptions {
    /// Dry-run options for `root` with default settings.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let config = Config::default();
        Self {
            root: root.into(),
            recurse: config.recurse,
            only_ext: config.only_ext,
            commit: false,
            within: false,
            trash: config.trash,
            io_threads: config.io_threads,
            chunk_size: config.chunk_size,
            format: OutputFormat::Text,
        }
    }

    /// Combine loaded configuration with command-line flags (flags win).
    #[must_use]
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            root: cli.directory.clone(),
            recurse: cli.recurse || config.recurse,
            only_ext: if cli.only_ext.is_empty() {
                config.only_ext.clone()
            } else {
                cli.only_ext.clone()
            },
            commit: cli.commit,
            within: cli.within,
            trash: cli.trash || config.trash,
            io_threads: cli.io_threads.unwrap_or(config.io_threads).max(1),
            chunk_size: config.chunk_size,
            format: cli.format,
        }
    }
}

/// Run both phases and build the report.
///
/// # Errors
///
/// Returns [`FinderError`] if the root is missing or not a directory. Every
/// other failure is per item and ends up in the report.
pub fn run(
    options: &RunOptions,
    shutdown: &ShutdownHandler,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<RunReport, FinderError> {
    FinderError::validate_root(&options.root)?;
    log::info!(
        "Scanning {} ({})",
        options.root.display(),
        if options.commit { "commit" } else { "dry run" }
    );

    let walker_config = WalkerConfig::new(options.recurse, &options.only_ext);
    let (files, scan_errors) = Walker::new(&options.root, walker_config)
        .with_shutdown_flag(shutdown.get_flag())
        .collect();

    let mut finder_config = FinderConfig::default()
        .with_io_threads(options.io_threads)
        .with_chunk_size(options.chunk_size)
        .with_shutdown_flag(shutdown.get_flag());
    if let Some(ref callback) = progress {
        finder_config = finder_config.with_progress_callback(Arc::clone(callback));
    }
    let (groups, summary) = DuplicateFinder::new(finder_config).find_duplicates(&files);

    let delete_config = DeleteConfig {
        trash: options.trash,
    };
    // Phase 2 skips deleted files, or on a dry run the planned deletions.
    let mut removed: HashSet<PathBuf> = HashSet::new();
    let mut group_reports = Vec::with_capacity(groups.len());
    for group in groups {
        let deletions = if options.commit && !shutdown.is_shutdown_requested() {
            delete_duplicates(&group, &delete_config)
        } else {
            Vec::new()
        };
        if options.commit {
            removed.extend(deletions.iter().filter(|d| d.deleted).map(|d| d.path.clone()));
        } else {
            removed.extend(group.duplicates().iter().map(|f| f.path.clone()));
        }
        group_reports.push(GroupReport { group, deletions });
    }

    let mut documents = Vec::new();
    let mut documents_interrupted = false;
    if options.within && !shutdown.is_shutdown_requested() {
        let remaining: Vec<_> = files
            .into_iter()
            .filter(|f| !removed.contains(&f.path))
            .collect();
        let mut pipeline_config = PipelineConfig::default()
            .with_commit(options.commit)
            .with_io_threads(options.io_threads)
            .with_shutdown_flag(shutdown.get_flag());
        if let Some(callback) = progress {
            pipeline_config = pipeline_config.with_progress_callback(callback);
        }
        (documents, documents_interrupted) =
            StructuralDedup::new(pipeline_config).process_all(&remaining);
    }

    let interrupted =
        summary.interrupted || documents_interrupted || shutdown.is_shutdown_requested();

    Ok(RunReport {
        root: options.root.clone(),
        committed: options.commit,
        within: options.within,
        scan_errors: scan_errors.iter().map(ToString::to_string).collect(),
        groups: group_reports,
        summary,
        documents,
        interrupted,
    })
}

/// Application entry point after argument parsing.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the report
/// cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = FinderError::validate_root(&cli.directory) {
        eprintln!("[{}] Error: {}", ExitCode::InvalidRoot.code_prefix(), e);
        return Ok(ExitCode::InvalidRoot);
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let options = RunOptions::resolve(&cli, &config);
    log::debug!("Resolved options: {:?}", options);

    let shutdown = match signal::install_handler() {
        Ok(handler) => handler,
        Err(e) => {
            log::warn!("{}; Ctrl+C will terminate immediately", e);
            ShutdownHandler::new()
        }
    };
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    let report = run(&options, &shutdown, Some(progress))?;

    let mut stdout = std::io::stdout().lock();
    report
        .write_to(&mut stdout, options.format)
        .context("Failed to write report")?;
    stdout.flush().context("Failed to write report")?;

    Ok(if report.interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    })
}
