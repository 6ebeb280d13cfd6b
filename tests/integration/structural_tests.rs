use spdedup::container::ContainerStore;
use spdedup::output::TextOutput;
use spdedup::signal::ShutdownHandler;
use spdedup::structural::{extract_units, DocumentKind, DocumentOutcome};
use spdedup::{run, RunOptions};
use std::fs;
use tempfile::tempdir;

use super::common::{
    entry_names, read_entry, write_container, write_docx, write_xlsx, CONTENT_TYPES, STYLES,
};

fn options(root: &std::path::Path, commit: bool) -> RunOptions {
    let mut options = RunOptions::new(root);
    options.within = true;
    options.commit = commit;
    options
}

fn paragraph_texts(path: &std::path::Path) -> Vec<String> {
    let payload = read_entry(path, "word/document.xml");
    extract_units(&payload, DocumentKind::WordDocument)
        .unwrap()
        .into_iter()
        .map(|u| u.text)
        .collect()
}

fn row_texts(path: &std::path::Path) -> Vec<String> {
    let payload = read_entry(path, "xl/worksheets/sheet1.xml");
    extract_units(&payload, DocumentKind::Spreadsheet)
        .unwrap()
        .into_iter()
        .map(|u| u.text)
        .collect()
}

#[test]
fn test_docx_commit_removes_repeated_paragraph() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "report.docx", &["Hello", "World", "Hello"]);
    let names_before = entry_names(&path);

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(
        report.documents[0].outcome,
        DocumentOutcome::Committed {
            total: 3,
            removed: 1
        }
    );
    assert_eq!(paragraph_texts(&path), vec!["Hello", "World"]);

    // Everything else in the container survives untouched.
    assert_eq!(entry_names(&path), names_before);
    assert_eq!(read_entry(&path, "word/styles.xml"), STYLES);
    assert_eq!(read_entry(&path, "[Content_Types].xml"), CONTENT_TYPES);
    let xml = String::from_utf8(read_entry(&path, "word/document.xml")).unwrap();
    assert!(xml.contains("<w:sectPr><w:pgSz w:w=\"12240\"/></w:sectPr>"));

    let text = TextOutput::new(&report).render();
    assert!(text.contains(&format!(
        "[DOCX] {}\n    units total=3, removed=1\n",
        path.display()
    )));
}

#[test]
fn test_docx_dry_run_reports_counts_only() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "report.docx", &["Hello", "World", "Hello"]);
    let before = fs::read(&path).unwrap();

    let report = run(&options(dir.path(), false), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(
        report.documents[0].outcome,
        DocumentOutcome::DryRun {
            total: 3,
            removed: 1
        }
    );
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_empty_paragraphs_are_never_removed() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "spaced.docx", &["", "A", "", "A", ""]);

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.documents[0].outcome.counts(), Some((5, 1)));
    assert_eq!(paragraph_texts(&path), vec!["", "A", "", ""]);
}

#[test]
fn test_document_without_duplicates_is_not_rewritten() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "unique.docx", &["One", "Two"]);
    let before = fs::read(&path).unwrap();

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(
        report.documents[0].outcome,
        DocumentOutcome::Unchanged { total: 2 }
    );
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_xlsx_duplicate_rows_removed() {
    let dir = tempdir().unwrap();
    let path = write_xlsx(
        dir.path(),
        "book.xlsx",
        &[&["1", "2"], &["3"], &["1", "2"], &["12"]],
        &[],
    );

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.documents[0].outcome.counts(), Some((4, 1)));
    assert_eq!(row_texts(&path), vec!["1|2|", "3|", "12|"]);
    assert_eq!(read_entry(&path, "xl/sharedStrings.xml"), b"<sst></sst>");
}

#[test]
fn test_xlsx_shared_string_indices_compared_literally() {
    let dir = tempdir().unwrap();
    // Both indices resolve to "Hello", but the stored values differ.
    let path = write_xlsx(
        dir.path(),
        "shared.xlsx",
        &[&["0"], &["1"]],
        &["Hello", "Hello"],
    );
    let before = fs::read(&path).unwrap();

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(
        report.documents[0].outcome,
        DocumentOutcome::Unchanged { total: 2 }
    );
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_xlsx_literal_value_differs_from_shared_string_reference() {
    let dir = tempdir().unwrap();
    // Row 1 holds "Hello" inline; row 2 points at shared string 0, also "Hello".
    let sheet = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
        <sheetData>\
        <row r=\"1\"><c r=\"A1\" t=\"str\"><v>Hello</v></c></row>\
        <row r=\"2\"><c r=\"A2\" t=\"s\"><v>0</v></c></row>\
        </sheetData></worksheet>";
    let path = dir.path().join("mixed.xlsx");
    write_container(
        &path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
            ("xl/sharedStrings.xml", &b"<sst><si><t>Hello</t></si></sst>"[..]),
        ],
    );
    let before = fs::read(&path).unwrap();

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(
        report.documents[0].outcome,
        DocumentOutcome::Unchanged { total: 2 }
    );
    assert_eq!(row_texts(&path), vec!["Hello|", "0|"]);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_missing_payload_is_a_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hollow.docx");
    write_container(&path, &[("word/styles.xml", STYLES)]);

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert!(matches!(
        report.documents[0].outcome,
        DocumentOutcome::Skipped { .. }
    ));
    let text = TextOutput::new(&report).render();
    let header = format!("[DOCX] {}\n  [WARN] ", path.display());
    assert!(text.contains(&header));
    assert!(text.contains("word/document.xml"));
}

#[test]
fn test_not_a_zip_is_a_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fake.xlsx");
    fs::write(&path, b"plain text pretending").unwrap();

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert!(matches!(
        report.documents[0].outcome,
        DocumentOutcome::Skipped { .. }
    ));
    assert_eq!(fs::read(&path).unwrap(), b"plain text pretending");
}

#[test]
fn test_files_deleted_by_file_phase_are_not_revisited() {
    let dir = tempdir().unwrap();
    let keep = write_docx(dir.path(), "a.docx", &["Hello", "Hello"]);
    let dup = write_docx(dir.path(), "b.docx", &["Hello", "Hello"]);

    let report = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();

    assert!(!dup.exists());
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].path, keep);
    assert_eq!(paragraph_texts(&keep), vec!["Hello"]);
}

#[test]
fn test_dry_run_skips_documents_the_file_phase_would_delete() {
    let dir = tempdir().unwrap();
    let keep = write_docx(dir.path(), "a.docx", &["Hello", "Hello"]);
    let dup = write_docx(dir.path(), "b.docx", &["Hello", "Hello"]);
    let before = fs::read(&dup).unwrap();

    let dry = run(&options(dir.path(), false), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(fs::read(&dup).unwrap(), before);
    assert_eq!(dry.documents.len(), 1);
    assert!(dry.documents.iter().all(|d| d.path != dup));
    assert_eq!(dry.documents[0].path, keep);
    assert_eq!(dry.documents[0].outcome.counts(), Some((2, 1)));

    let text = TextOutput::new(&dry).render();
    assert!(!text.contains(&format!("[DOCX] {}", dup.display())));

    let commit = run(&options(dir.path(), true), &ShutdownHandler::new(), None).unwrap();
    let dry_paths: Vec<_> = dry.documents.iter().map(|d| &d.path).collect();
    let commit_paths: Vec<_> = commit.documents.iter().map(|d| &d.path).collect();
    assert_eq!(dry_paths, commit_paths);
}

#[test]
fn test_within_disabled_skips_documents() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "report.docx", &["Hello", "Hello"]);
    let before = fs::read(&path).unwrap();

    let mut opts = options(dir.path(), true);
    opts.within = false;
    let report = run(&opts, &ShutdownHandler::new(), None).unwrap();

    assert!(report.documents.is_empty());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_replace_entry_then_list_and_read() {
    let dir = tempdir().unwrap();
    let path = write_docx(dir.path(), "r.docx", &["x"]);
    let store = ContainerStore::new();

    store
        .replace_entry(&path, "word/styles.xml", b"<new/>")
        .unwrap();

    assert_eq!(store.read_entry(&path, "word/styles.xml").unwrap(), b"<new/>");
    assert_eq!(
        store.list_entries(&path).unwrap(),
        vec!["[Content_Types].xml", "word/document.xml", "word/styles.xml"]
    );
}
