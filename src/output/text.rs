//! Line-oriented text report.
//!
//! Lines that other tooling depends on:
//!
//! ```text
//!     units total=<N>, removed=<M>
//!   [WARN] <reason>.
//!   [ERR] <reason>.
//! ```
//!
//! A reason never ends up with two trailing periods: any period already at
//! the end of a reason is dropped before the terminating one is written.

use std::io::{self, Write};

use bytesize::ByteSize;

use super::{GroupReport, RunReport};
use crate::structural::{DocumentOutcome, DocumentReport};

/// Text renderer over a finished report.
pub struct TextOutput<'a> {
    report: &'a RunReport,
}

impl<'a> TextOutput<'a> {
    /// Wrap a report.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    /// Render to a `String`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;

        for error in &report.scan_errors {
            warn_line(w, error)?;
        }
        for failure in &report.summary.digest_failures {
            warn_line(
                w,
                &format!("Digest failed for {}: {}", failure.path.display(), failure.message),
            )?;
        }

        for group in &report.groups {
            write_group(w, group, report.committed)?;
        }

        let summary = &report.summary;
        writeln!(w)?;
        writeln!(w, "Scanned files: {}", summary.files_scanned)?;
        writeln!(w, "Duplicate sets: {}", summary.duplicate_groups)?;
        writeln!(w, "Files removable: {}", summary.removable_files)?;
        writeln!(
            w,
            "Reclaimable: {}",
            ByteSize::b(summary.reclaimable_bytes)
        )?;
        if report.committed {
            writeln!(w, "Files deleted: {}", report.deleted_files())?;
        }

        for document in &report.documents {
            write_document(w, document)?;
        }

        if report.interrupted {
            writeln!(w)?;
            warn_line(w, "Interrupted; remaining items were not processed")?;
        } else if !report.committed && has_pending_changes(report) {
            writeln!(w)?;
            writeln!(w, "Dry run: nothing was changed. Re-run with --commit to apply.")?;
        }
        Ok(())
    }
}

fn has_pending_changes(report: &RunReport) -> bool {
    !report.groups.is_empty()
        || report
            .documents
            .iter()
            .any(|d| matches!(d.outcome, DocumentOutcome::DryRun { .. }))
}

fn write_group<W: Write>(w: &mut W, group: &GroupReport, committed: bool) -> io::Result<()> {
    let g = &group.group;
    writeln!(w)?;
    writeln!(
        w,
        "Duplicate set (ext={}, size={}, digest={})",
        display_extension(&g.extension),
        g.size,
        g.digest_hex()
    )?;
    for (i, file) in g.files.iter().enumerate() {
        let role = if i == 0 { "KEEP" } else { "DEL " };
        writeln!(w, "  [{}] {}", role, file.path.display())?;
    }
    if committed {
        for outcome in &group.deletions {
            match &outcome.error {
                None => writeln!(w, "     deleted: {}", outcome.path.display())?,
                Some(error) => error_line(w, error)?,
            }
        }
    }
    Ok(())
}

fn write_document<W: Write>(w: &mut W, document: &DocumentReport) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "[{}] {}", document.kind.label(), document.path.display())?;
    if let Some((total, removed)) = document.outcome.counts() {
        units_line(w, total, removed)?;
    }
    match &document.outcome {
        DocumentOutcome::Skipped { reason, .. } => warn_line(w, reason),
        DocumentOutcome::Unchanged { .. } => writeln!(w, "    no change"),
        DocumentOutcome::DryRun { removed, .. } => {
            writeln!(w, "    would remove {removed} unit(s)")
        }
        DocumentOutcome::Committed { .. } => writeln!(w, "    rewrote {}", document.entry),
        DocumentOutcome::WriteFailed { reason, .. } => error_line(w, reason),
    }
}

/// `    units total=<N>, removed=<M>`
pub fn units_line<W: Write>(w: &mut W, total: usize, removed: usize) -> io::Result<()> {
    writeln!(w, "    units total={total}, removed={removed}")
}

/// `  [WARN] <reason>.`
pub fn warn_line<W: Write>(w: &mut W, reason: &str) -> io::Result<()> {
    writeln!(w, "  [WARN] {}.", sentence(reason))
}

/// `  [ERR] <reason>.`
pub fn error_line<W: Write>(w: &mut W, reason: &str) -> io::Result<()> {
    writeln!(w, "  [ERR] {}.", sentence(reason))
}

fn sentence(reason: &str) -> &str {
    reason.trim_end().trim_end_matches('.')
}

fn display_extension(extension: &str) -> &str {
    if extension.is_empty() {
        "(none)"
    } else {
        extension
    }
}
