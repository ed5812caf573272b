//! End-to-end tests that run the built `lithium` binary against a real
//! predicate script and check the file it leaves behind, mirroring the way
//! the teacher's own integration suite drives its reducer binary against
//! fixture test cases and diffs the result.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn predicate(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/predicates")
        .join(name)
}

/// Copy `fixture_name` into a scratch directory, run `lithium` with `extra_args`
/// against it, and return the reduced file's final contents.
fn run_lithium(fixture_name: &str, predicate_name: &str, extra_args: &[&str]) -> String {
    let dir = tempfile::tempdir().unwrap();
    let testcase = dir.path().join(fixture_name);
    fs::copy(fixture(fixture_name), &testcase).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_lithium"))
        .args(extra_args)
        .arg("--tempdir")
        .arg(dir.path().join("workspace"))
        .arg(predicate(predicate_name))
        .arg(&testcase)
        .status()
        .expect("should run the lithium binary OK");
    assert!(status.success(), "lithium should exit 0");

    fs::read_to_string(&testcase).unwrap()
}

#[test]
fn minimize_shrinks_to_the_line_containing_the_needle() {
    let reduced = run_lithium(
        "needle.txt",
        "contains-x.sh",
        &["--strategy=minimize", "--repeat=last"],
    );
    assert_eq!(reduced, "X\n");
}

#[test]
fn minimize_balanced_keeps_braces_matched_around_the_needle() {
    let reduced = run_lithium(
        "braces.txt",
        "contains-x-balanced-braces.sh",
        &["--strategy=minimize-balanced", "--repeat=last"],
    );
    assert_eq!(reduced, "X\n");
}

#[test]
fn check_only_reports_the_verdict_without_touching_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let testcase = dir.path().join("needle.txt");
    fs::copy(fixture("needle.txt"), &testcase).unwrap();
    let before = fs::read_to_string(&testcase).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lithium"))
        .arg("--strategy=check-only")
        .arg("--tempdir")
        .arg(dir.path().join("workspace"))
        .arg(predicate("contains-x.sh"))
        .arg(&testcase)
        .output()
        .expect("should run the lithium binary OK");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Interesting."));
    assert_eq!(fs::read_to_string(&testcase).unwrap(), before);
}

#[test]
fn dd_section_only_reduces_the_marked_region() {
    let dir = tempfile::tempdir().unwrap();
    let testcase = dir.path().join("case.txt");
    fs::write(&testcase, "head\nDDBEGIN\na\nb\nX\nc\nDDEND\ntail\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_lithium"))
        .arg("--strategy=minimize")
        .arg("--repeat=last")
        .arg("--tempdir")
        .arg(dir.path().join("workspace"))
        .arg(predicate("contains-x.sh"))
        .arg(&testcase)
        .status()
        .expect("should run the lithium binary OK");
    assert!(status.success());

    let reduced = fs::read_to_string(&testcase).unwrap();
    assert_eq!(reduced, "head\nDDBEGIN\nX\nDDEND\ntail\n");
}

#[test]
fn usage_error_on_non_power_of_two_chunk_bound_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let testcase = dir.path().join("needle.txt");
    fs::copy(fixture("needle.txt"), &testcase).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lithium"))
        .arg("--min=3")
        .arg("--tempdir")
        .arg(dir.path().join("workspace"))
        .arg(predicate("contains-x.sh"))
        .arg(&testcase)
        .output()
        .expect("should run the lithium binary OK");

    assert_eq!(output.status.code(), Some(2));
}
