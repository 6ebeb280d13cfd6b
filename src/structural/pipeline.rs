//! Per-document scan, decision and rewrite.
//!
//! # State machine
//!
//! Each document ends in exactly one [`DocumentOutcome`]:
//!
//! ```text
//! NotScanned -> Skipped                       (payload missing or unparseable)
//! NotScanned -> Scanned(no dup)  -> Unchanged
//! NotScanned -> Scanned(has dup) -> DryRun | Committed | WriteFailed
//! ```
//!
//! A write is attempted only in commit mode and only when there is at least
//! one unit to remove.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use super::{extract_units, plan_removals, rebuild_without, DocumentKind};
use crate::container::{ContainerError, ContainerStore};
use crate::error::ErrorKind;
use crate::progress::ProgressCallback;
use crate::scanner::FileRecord;
use crate::workers;

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// The payload could not be read or parsed; nothing was changed.
    Skipped {
        /// Failure classification
        #[serde(rename = "error")]
        kind: ErrorKind,
        /// Human-readable reason
        reason: String,
    },
    /// No removable duplicates.
    Unchanged {
        /// Units scanned
        total: usize,
    },
    /// Duplicates found, dry-run: nothing written.
    DryRun {
        /// Units scanned
        total: usize,
        /// Units that would be removed
        removed: usize,
    },
    /// Duplicates removed and the container rewritten.
    Committed {
        /// Units scanned
        total: usize,
        /// Units removed
        removed: usize,
    },
    /// Duplicates found but the rewrite failed; the container is unchanged.
    WriteFailed {
        /// Units scanned
        total: usize,
        /// Units that would have been removed
        removed: usize,
        /// Failure classification
        #[serde(rename = "error")]
        kind: ErrorKind,
        /// Human-readable reason
        reason: String,
    },
}

impl DocumentOutcome {
    /// `(total, removed)` for outcomes that got as far as scanning.
    #[must_use]
    pub fn counts(&self) -> Option<(usize, usize)> {
        match self {
            Self::Skipped { .. } => None,
            Self::Unchanged { total } => Some((*total, 0)),
            Self::DryRun { total, removed }
            | Self::Committed { total, removed }
            | Self::WriteFailed { total, removed, .. } => Some((*total, *removed)),
        }
    }
}

/// Report for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    /// Document path
    pub path: PathBuf,
    /// Document kind
    pub kind: DocumentKind,
    /// Payload entry that was examined
    pub entry: &'static str,
    /// What happened
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

/// Configuration for the structural pass.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Rewrite containers instead of only reporting.
    pub commit: bool,
    /// Worker threads for scanning documents.
    pub io_threads: usize,
    /// Stop starting new documents once set.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("commit", &self.commit)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commit: false,
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl PipelineConfig {
    /// Enable or disable commit mode.
    #[must_use]
    pub fn with_commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag.
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

/// Structural deduplication over container documents.
#[derive(Debug)]
pub struct StructuralDedup {
    config: PipelineConfig,
    store: ContainerStore,
}

impl StructuralDedup {
    /// Create a pipeline.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            store: ContainerStore::new(),
        }
    }

    /// Process one document. Returns `None` if its extension is not a
    /// supported kind.
    #[must_use]
    pub fn process(&self, path: &Path) -> Option<DocumentReport> {
        let kind = DocumentKind::from_extension(&crate::scanner::normalize_extension_of(path))?;
        Some(self.process_kind(path, kind))
    }

    /// Process every supported document in `files`, in parallel, returning
    /// reports in the order of `files`. The flag is `true` if the pass was
    /// cut short by a shutdown request.
    #[must_use]
    pub fn process_all(&self, files: &[FileRecord]) -> (Vec<DocumentReport>, bool) {
        let documents: Vec<(&FileRecord, DocumentKind)> = files
            .iter()
            .filter_map(|f| DocumentKind::from_extension(&f.extension).map(|k| (f, k)))
            .collect();

        if documents.is_empty() {
            log::debug!("Structural pass: no supported documents");
            return (Vec::new(), false);
        }

        log::info!("Structural pass: {} document(s)", documents.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("documents", documents.len());
        }

        let pool = workers::io_pool(self.config.io_threads);
        let results: Vec<Option<DocumentReport>> = workers::install(pool.as_ref(), || {
            documents
                .par_iter()
                .enumerate()
                .map(|(idx, (file, kind))| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, file.path.to_string_lossy().as_ref());
                    }
                    Some(self.process_kind(&file.path, *kind))
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("documents");
        }

        let interrupted = results.iter().any(Option::is_none);
        if interrupted {
            log::info!("Structural pass: interrupted by shutdown signal");
        }
        (results.into_iter().flatten().collect(), interrupted)
    }

    fn process_kind(&self, path: &Path, kind: DocumentKind) -> DocumentReport {
        let entry = kind.payload_entry();
        let outcome = self.run(path, kind);
        match &outcome {
            DocumentOutcome::Skipped { reason, .. } => {
                log::warn!("Skipping {}: {}", path.display(), reason);
            }
            DocumentOutcome::WriteFailed { reason, .. } => {
                log::error!("Rewrite of {} failed: {}", path.display(), reason);
            }
            other => log::debug!("{}: {:?}", path.display(), other),
        }
        DocumentReport {
            path: path.to_path_buf(),
            kind,
            entry,
            outcome,
        }
    }

    fn run(&self, path: &Path, kind: DocumentKind) -> DocumentOutcome {
        let entry = kind.payload_entry();

        let payload = match self.store.read_entry(path, entry) {
            Ok(payload) => payload,
            Err(e) => {
                return DocumentOutcome::Skipped {
                    kind: e.kind(),
                    reason: format!("Unable to open {entry}: {e}"),
                }
            }
        };

        let units = match extract_units(&payload, kind) {
            Ok(units) => units,
            Err(e) => {
                return DocumentOutcome::Skipped {
                    kind: ErrorKind::Format,
                    reason: format!("{entry}: {e}"),
                }
            }
        };

        let total = units.len();
        let removals = plan_removals(&units);
        let removed = removals.len();

        if removed == 0 {
            return DocumentOutcome::Unchanged { total };
        }
        if !self.config.commit {
            return DocumentOutcome::DryRun { total, removed };
        }

        let rebuilt = rebuild_without(&payload, &units, &removals);
        match self.store.replace_entry(path, entry, &rebuilt) {
            Ok(()) => DocumentOutcome::Committed { total, removed },
            Err(e) => DocumentOutcome::WriteFailed {
                total,
                removed,
                kind: e.kind(),
                reason: write_failure_reason(entry, &e),
            },
        }
    }
}

fn write_failure_reason(entry: &str, e: &ContainerError) -> String {
    format!("Failed to write {entry} back: {e}")
}
