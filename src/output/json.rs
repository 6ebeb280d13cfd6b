//! JSON output for automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "report": {
//!     "root": "/data",
//!     "committed": false,
//!     "within": true,
//!     "scan_errors": [],
//!     "groups": [
//!       {
//!         "extension": ".txt",
//!         "size": 1,
//!         "digest": "ab12...",
//!         "files": [{ "path": "/data/a.txt", "size": 1, "extension": ".txt" }]
//!       }
//!     ],
//!     "summary": { "files_scanned": 3, "duplicate_groups": 1, "...": "..." },
//!     "documents": [
//!       {
//!         "path": "/data/r.docx",
//!         "kind": "word_document",
//!         "entry": "word/document.xml",
//!         "status": "dry_run",
//!         "total": 3,
//!         "removed": 1
//!       }
//!     ],
//!     "interrupted": false
//!   },
//!   "exit_code": 0,
//!   "exit_code_name": "SD000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::RunReport;
use crate::error::ExitCode;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// The run report
    pub report: &'a RunReport,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "SD000")
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Wrap a report; the exit code follows from whether it was interrupted.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        let exit_code = if report.interrupted {
            ExitCode::Interrupted
        } else {
            ExitCode::Success
        };
        Self {
            report,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
