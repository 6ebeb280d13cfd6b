//! Unit extraction and span-filtering rebuild over payload markup.
//!
//! The payload is read once with a streaming XML reader. For every element
//! the reader reports its byte offsets, so a unit is recorded as the byte
//! range of its element. Rebuilding a payload never re-serializes markup; it
//! copies the original bytes and skips the spans of removed units, which
//! keeps attributes, namespaces and formatting of everything else intact.

use std::collections::BTreeSet;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

use super::{DocumentKind, StructuralUnit, UnitGrammar};

/// Why a payload could not be scanned.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The markup is not well formed.
    #[error("XML parse failed at byte {position}: {message}")]
    Malformed {
        /// Reader offset where parsing stopped
        position: usize,
        /// Parser message
        message: String,
    },

    /// The element that holds units never appeared.
    #[error("no <{0}> element")]
    MissingContainer(String),
}

/// A unit whose end tag has not been seen yet.
struct OpenUnit {
    start: usize,
    depth: usize,
    text: String,
    has_text: bool,
    pinned: bool,
}

/// Scan `payload` for the units of `kind`, in document order.
///
/// # Errors
///
/// [`ExtractError::Malformed`] for markup that does not parse (including a
/// document that ends with open elements), [`ExtractError::MissingContainer`]
/// if the unit container element is absent.
pub fn extract_units(
    payload: &[u8],
    kind: DocumentKind,
) -> Result<Vec<StructuralUnit>, ExtractError> {
    let grammar = kind.grammar();
    let mut reader = Reader::from_reader(payload);

    let mut units = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut open: Option<OpenUnit> = None;
    let mut leaf_depth: Option<usize> = None;
    let mut saw_container = false;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| ExtractError::Malformed {
            position: reader.buffer_position() as usize,
            message: e.to_string(),
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                if name.as_slice() == grammar.container {
                    saw_container = true;
                }
                if open.is_none() && is_unit_boundary(&grammar, &stack, &name) {
                    open = Some(OpenUnit {
                        start,
                        depth: stack.len(),
                        text: String::new(),
                        has_text: false,
                        pinned: false,
                    });
                } else if let Some(unit) = open.as_mut() {
                    if leaf_depth.is_none() && name.as_slice() == grammar.leaf {
                        leaf_depth = Some(stack.len());
                    }
                    if grammar.pin == Some(name.as_slice()) {
                        unit.pinned = true;
                    }
                }
                stack.push(name);
            }
            Event::Empty(element) => {
                let name = element.local_name();
                let name = name.as_ref();
                if name == grammar.container {
                    saw_container = true;
                }
                if open.is_none() && is_unit_boundary(&grammar, &stack, name) {
                    units.push(StructuralUnit {
                        ordinal: units.len(),
                        text: String::new(),
                        span: start..end,
                        has_text: false,
                        pinned: false,
                    });
                } else if let Some(unit) = open.as_mut() {
                    if leaf_depth.is_none() && name == grammar.leaf {
                        if let Some(terminator) = grammar.leaf_terminator {
                            unit.text.push(terminator);
                        }
                    }
                    if grammar.pin == Some(name) {
                        unit.pinned = true;
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
                let depth = stack.len();

                if leaf_depth == Some(depth) {
                    leaf_depth = None;
                    if let (Some(unit), Some(terminator)) = (open.as_mut(), grammar.leaf_terminator)
                    {
                        unit.text.push(terminator);
                    }
                }

                if open.as_ref().is_some_and(|unit| unit.depth == depth) {
                    if let Some(unit) = open.take() {
                        units.push(StructuralUnit {
                            ordinal: units.len(),
                            text: unit.text,
                            span: unit.start..end,
                            has_text: unit.has_text,
                            pinned: unit.pinned,
                        });
                    }
                }
            }
            Event::Text(text) => {
                if let (Some(unit), Some(_)) = (open.as_mut(), leaf_depth) {
                    let content = text.unescape().map_err(|e| ExtractError::Malformed {
                        position: start,
                        message: e.to_string(),
                    })?;
                    unit.has_text |= !content.is_empty();
                    unit.text.push_str(&content);
                }
            }
            Event::CData(data) => {
                if let (Some(unit), Some(_)) = (open.as_mut(), leaf_depth) {
                    let content = String::from_utf8_lossy(&data).into_owned();
                    unit.has_text |= !content.is_empty();
                    unit.text.push_str(&content);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ExtractError::Malformed {
            position: payload.len(),
            message: format!("unexpected end of document, {} element(s) open", stack.len()),
        });
    }
    if !saw_container {
        return Err(ExtractError::MissingContainer(
            String::from_utf8_lossy(grammar.container).into_owned(),
        ));
    }

    log::trace!("Extracted {} {} unit(s)", units.len(), kind.label());
    Ok(units)
}

fn is_unit_boundary(grammar: &UnitGrammar, stack: &[Vec<u8>], name: &[u8]) -> bool {
    name == grammar.marker && stack.last().is_some_and(|parent| parent.as_slice() == grammar.container)
}

/// Copy `payload`, leaving out the spans of the units whose ordinal is in
/// `removed`. Units must be in document order, as returned by
/// [`extract_units`].
#[must_use]
pub fn rebuild_without(
    payload: &[u8],
    units: &[StructuralUnit],
    removed: &BTreeSet<usize>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len());
    let mut cursor = 0;
    for unit in units.iter().filter(|u| removed.contains(&u.ordinal)) {
        out.extend_from_slice(&payload[cursor..unit.span.start]);
        cursor = unit.span.end;
    }
    out.extend_from_slice(&payload[cursor..]);
    out
}
