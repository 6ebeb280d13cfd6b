use spdedup::output::TextOutput;
use spdedup::signal::ShutdownHandler;
use spdedup::{run, RunOptions};
use std::fs;
use tempfile::tempdir;

use super::common::{snapshot, write_docx, write_file};

fn options(root: &std::path::Path) -> RunOptions {
    let mut options = RunOptions::new(root);
    options.io_threads = 2;
    options
}

#[test]
fn test_dry_run_reports_without_deleting() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.txt", b"X");
    let b = write_file(dir.path(), "b.txt", b"X");
    let c = write_file(dir.path(), "c.txt", b"YY");

    let report = run(&options(dir.path()), &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0].group;
    assert_eq!(group.keep().unwrap().path, a);
    assert_eq!(group.duplicates()[0].path, b);
    assert!(report.groups[0].deletions.is_empty());
    assert!(a.exists() && b.exists() && c.exists());

    assert_eq!(report.summary.files_scanned, 3);
    assert_eq!(report.summary.duplicate_groups, 1);
    assert_eq!(report.summary.removable_files, 1);

    let text = TextOutput::new(&report).render();
    assert!(text.contains(&format!("  [KEEP] {}\n", a.display())));
    assert!(text.contains(&format!("  [DEL ] {}\n", b.display())));
    assert!(!text.contains(&c.display().to_string()));
}

#[test]
fn test_commit_deletes_only_duplicates() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.txt", b"X");
    let b = write_file(dir.path(), "b.txt", b"X");
    let c = write_file(dir.path(), "c.txt", b"YY");

    let mut opts = options(dir.path());
    opts.commit = true;
    let report = run(&opts, &ShutdownHandler::new(), None).unwrap();

    assert!(a.exists());
    assert!(!b.exists());
    assert!(c.exists());
    assert_eq!(report.deleted_files(), 1);

    let text = TextOutput::new(&report).render();
    assert!(text.contains(&format!("     deleted: {}\n", b.display())));
}

#[test]
fn test_dry_run_never_mutates() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "one.bin", b"same bytes");
    write_file(dir.path(), "two.bin", b"same bytes");
    write_file(dir.path(), "sub/three.bin", b"same bytes");
    write_docx(dir.path(), "report.docx", &["Hello", "World", "Hello"]);
    write_docx(dir.path(), "sub/copy.docx", &["A", "A"]);
    let before = snapshot(dir.path());

    let mut opts = options(dir.path());
    opts.recurse = true;
    opts.within = true;
    let report = run(&opts, &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.summary.duplicate_groups, 1);
    assert_eq!(report.documents.len(), 2);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn test_keep_follows_traversal_order() {
    let dir = tempdir().unwrap();
    let z = write_file(dir.path(), "z.txt", b"dup");
    let m = write_file(dir.path(), "m.txt", b"dup");
    let a = write_file(dir.path(), "a.txt", b"dup");

    let report = run(&options(dir.path()), &ShutdownHandler::new(), None).unwrap();

    let files: Vec<_> = report.groups[0]
        .group
        .files
        .iter()
        .map(|f| f.path.clone())
        .collect();
    assert_eq!(files, vec![a, m, z]);
}

#[test]
fn test_extension_separates_identical_content() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"same");
    write_file(dir.path(), "a.md", b"same");

    let report = run(&options(dir.path()), &ShutdownHandler::new(), None).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.files_digested, 0);
}

#[test]
fn test_recurse_flag() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"dup");
    write_file(dir.path(), "nested/b.txt", b"dup");

    let flat = run(&options(dir.path()), &ShutdownHandler::new(), None).unwrap();
    assert_eq!(flat.summary.files_scanned, 1);
    assert!(flat.groups.is_empty());

    let mut opts = options(dir.path());
    opts.recurse = true;
    let deep = run(&opts, &ShutdownHandler::new(), None).unwrap();
    assert_eq!(deep.summary.files_scanned, 2);
    assert_eq!(deep.groups.len(), 1);
}

#[test]
fn test_only_ext_filter() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"dup");
    write_file(dir.path(), "b.txt", b"dup");
    write_file(dir.path(), "a.log", b"dup");
    write_file(dir.path(), "b.log", b"dup");

    let mut opts = options(dir.path());
    opts.only_ext = vec!["LOG".to_string()];
    let report = run(&opts, &ShutdownHandler::new(), None).unwrap();

    assert_eq!(report.summary.files_scanned, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].group.extension, ".log");
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();
    let report = run(&options(dir.path()), &ShutdownHandler::new(), None).unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.summary.files_scanned, 0);
    assert!(!report.interrupted);
}

#[test]
fn test_shutdown_before_run_touches_nothing() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.txt", b"X");
    let b = write_file(dir.path(), "b.txt", b"X");
    let shutdown = ShutdownHandler::new();
    shutdown.request_shutdown();

    let mut opts = options(dir.path());
    opts.commit = true;
    let report = run(&opts, &shutdown, None).unwrap();

    assert!(report.interrupted);
    assert!(a.exists() && b.exists());
    assert_eq!(fs::read(&b).unwrap(), b"X");
}
