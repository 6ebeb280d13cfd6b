//! Within-document deduplication of paragraphs and spreadsheet rows.
//!
//! # Overview
//!
//! Each supported document kind has exactly one payload entry inside its
//! container. The payload is scanned once to find its structural units
//! (paragraphs or rows) and their byte spans ([`extract`]), the removal set
//! is decided with a single forward pass over fingerprints ([`plan_removals`]),
//! and the payload is rebuilt by dropping the removed spans. Everything
//! outside those spans, including the survivors, is copied byte for byte.
//! [`pipeline`] ties this to the container store and the dry-run/commit mode.
//!
//! Spreadsheet rows are compared on their literal `<v>` values only. Shared
//! string indices are not resolved, so a row storing `"Hello"` inline and a
//! row referencing `"Hello"` through the shared-string table are different.

pub mod extract;
pub mod pipeline;

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

use serde::Serialize;

use crate::scanner::{digest_bytes, Digest};

pub use extract::{extract_units, rebuild_without, ExtractError};
pub use pipeline::{DocumentOutcome, DocumentReport, PipelineConfig, StructuralDedup};

/// Supported container-based document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Word processing document; units are body paragraphs.
    WordDocument,
    /// Spreadsheet; units are rows of the first worksheet.
    Spreadsheet,
}

impl DocumentKind {
    /// Map a normalized extension (`.docx`) to a kind.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".docx" | ".docm" => Some(Self::WordDocument),
            ".xlsx" | ".xlsm" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// The single payload entry this kind deduplicates.
    #[must_use]
    pub fn payload_entry(self) -> &'static str {
        match self {
            Self::WordDocument => "word/document.xml",
            Self::Spreadsheet => "xl/worksheets/sheet1.xml",
        }
    }

    /// Short tag used in the text report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WordDocument => "DOCX",
            Self::Spreadsheet => "XLSX",
        }
    }

    /// Element names that define units and their text for this kind.
    #[must_use]
    pub fn grammar(self) -> UnitGrammar {
        match self {
            Self::WordDocument => UnitGrammar {
                container: b"body",
                marker: b"p",
                leaf: b"t",
                leaf_terminator: None,
                pin: Some(b"sectPr"),
            },
            Self::Spreadsheet => UnitGrammar {
                container: b"sheetData",
                marker: b"row",
                leaf: b"v",
                leaf_terminator: Some('|'),
                pin: None,
            },
        }
    }
}

/// Local element names (namespace prefixes ignored) describing units.
#[derive(Debug, Clone, Copy)]
pub struct UnitGrammar {
    /// Parent element whose direct children are units.
    pub container: &'static [u8],
    /// Unit element.
    pub marker: &'static [u8],
    /// Text-leaf element whose content forms the unit text.
    pub leaf: &'static [u8],
    /// Appended after every leaf so adjacent values stay distinguishable.
    pub leaf_terminator: Option<char>,
    /// A unit containing this element is never removed.
    pub pin: Option<&'static [u8]>,
}

/// One paragraph or row of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralUnit {
    /// Position among the units, in document order.
    pub ordinal: usize,
    /// Depth-first concatenation of the unit's text leaves.
    pub text: String,
    /// Byte range of the unit element in the payload.
    pub span: Range<usize>,
    /// Whether any leaf carried non-empty text.
    pub has_text: bool,
    /// Carries structure that must survive (e.g. section properties).
    pub pinned: bool,
}

impl StructuralUnit {
    /// Digest of the unit text.
    #[must_use]
    pub fn fingerprint(&self) -> Digest {
        digest_bytes(self.text.as_bytes())
    }
}

/// Ordinals of units to remove: every later occurrence of a non-empty
/// fingerprint. Units without text and pinned units are never selected.
#[must_use]
pub fn plan_removals(units: &[StructuralUnit]) -> BTreeSet<usize> {
    let mut seen: HashSet<Digest> = HashSet::new();
    units
        .iter()
        .filter(|unit| unit.has_text)
        .filter(|unit| !seen.insert(unit.fingerprint()) && !unit.pinned)
        .map(|unit| unit.ordinal)
        .collect()
}
