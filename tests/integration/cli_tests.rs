use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

use super::common::{write_docx, write_file};

fn spdedup(args: &[&str], config_home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spdedup"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_no_arguments_exits_with_usage_error() {
    let home = tempdir().unwrap();
    let output = spdedup(&[], home.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_unknown_option_exits_with_usage_error() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let output = spdedup(&[dir.path().to_str().unwrap(), "--bogus"], home.path());
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_cleanly() {
    let home = tempdir().unwrap();
    let output = spdedup(&["--help"], home.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--within"));
}

#[test]
fn test_missing_directory_exits_with_2() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let output = spdedup(&[missing.to_str().unwrap()], home.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_file_instead_of_directory_exits_with_2() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "plain.txt", b"x");
    let output = spdedup(&[file.to_str().unwrap()], home.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_normal_run_exits_0_with_report() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"X");
    write_file(dir.path(), "b.txt", b"X");
    write_docx(dir.path(), "r.docx", &["Hello", "World", "Hello"]);

    let output = spdedup(&[dir.path().to_str().unwrap(), "--within", "-q"], home.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Duplicate sets: 1\n"));
    assert!(stdout.contains("    units total=3, removed=1\n"));
    assert!(dir.path().join("b.txt").exists());
}

#[test]
fn test_no_duplicates_is_still_success() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    write_file(dir.path(), "only.txt", b"X");
    let output = spdedup(&[dir.path().to_str().unwrap(), "-q"], home.path());
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_commit_with_json_output() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"X");
    write_file(dir.path(), "b.txt", b"X");

    let output = spdedup(
        &[
            dir.path().to_str().unwrap(),
            "--commit",
            "--format",
            "json",
            "-q",
        ],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["exit_code"], 0);
    assert_eq!(value["report"]["committed"], true);
    assert_eq!(value["report"]["groups"][0]["deletions"][0]["deleted"], true);
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_config_file_enables_recursion() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"X");
    write_file(dir.path(), "deep/b.txt", b"X");
    let config = write_file(home.path(), "custom.toml", b"recurse = true\n");

    let output = spdedup(
        &[
            dir.path().to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "-q",
        ],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Scanned files: 2\n"));
}

#[test]
fn test_missing_config_file_is_general_error() {
    let home = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let missing = home.path().join("absent.toml");
    let output = spdedup(
        &[dir.path().to_str().unwrap(), "--config", missing.to_str().unwrap()],
        home.path(),
    );
    assert_eq!(output.status.code(), Some(1));
}
