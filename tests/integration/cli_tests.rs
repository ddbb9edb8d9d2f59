//! CLI integration tests
//!
//! These tests run the built binary against small projects on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn droidlint() -> Command {
    Command::cargo_bin("droidlint").expect("binary is built")
}

fn project_dir() -> TempDir {
    tempfile::Builder::new().prefix("project").tempdir().unwrap()
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project whose only problem is a duplicated string
fn duplicate_project() -> TempDir {
    let dir = project_dir();
    write(
        dir.path(),
        "res/values/strings.xml",
        "<resources>\n    <string name=\"app_name\">Demo</string>\n    <string name=\"app_name\">Demo again</string>\n</resources>\n",
    );
    dir
}

#[test]
fn test_help() {
    droidlint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidlint"))
        .stdout(predicate::str::contains("--baseline"))
        .stdout(predicate::str::contains("--incremental"));
}

#[test]
fn test_list_issues() {
    droidlint()
        .arg("--list-issues")
        .assert()
        .success()
        .stdout(predicate::str::contains("DuplicateDefinition"))
        .stdout(predicate::str::contains("StringFormatMatches"))
        .stdout(predicate::str::contains("MissingPermission"));
}

#[test]
fn test_errors_fail_the_run() {
    let project = duplicate_project();
    droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--quiet"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "res/values/strings.xml:3: Error: `app_name` has already been defined in this folder [DuplicateDefinition]",
        ))
        .stdout(predicate::str::contains("1 errors, 0 warnings"));
}

#[test]
fn test_exit_zero() {
    let project = duplicate_project();
    droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--exit-zero", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 errors, 0 warnings"));
}

#[test]
fn test_disabled_issue_is_not_reported() {
    let project = duplicate_project();
    droidlint()
        .arg(project.path())
        .args(["--disable", "DuplicateDefinition", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DuplicateDefinition").not());
}

#[test]
fn test_json_output() {
    let project = duplicate_project();
    let output = droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--format", "json", "--exit-zero", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON report");
    assert_eq!(report["total_issues"], 1);
    assert_eq!(report["issues"][0]["id"], "DuplicateDefinition");
    assert_eq!(report["issues"][0]["file"], "res/values/strings.xml");
    assert_eq!(report["issues"][0]["line"], 3);
    assert_eq!(report["summary"]["errors"], 1);
}

#[test]
fn test_baseline_suppresses_known_incidents() {
    let project = duplicate_project();
    let baseline = project.path().join("lint-baseline.json");

    droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--quiet", "--generate-baseline"])
        .arg(&baseline)
        .assert()
        .code(1);
    assert!(baseline.exists());

    droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--quiet", "--baseline"])
        .arg(&baseline)
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings."));
}

#[test]
fn test_report_to_file() {
    let project = duplicate_project();
    let report = project.path().join("report.txt");

    droidlint()
        .arg(project.path())
        .args(["--check", "DuplicateDefinition", "--exit-zero", "--quiet", "--output"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let written = fs::read_to_string(&report).unwrap();
    assert!(written.contains("[DuplicateDefinition]"), "{}", written);
}

#[test]
fn test_config_file_disables_issue() {
    let project = duplicate_project();
    write(project.path(), ".droidlint.yml", "disable:\n  - DuplicateDefinition\n");

    droidlint()
        .arg(project.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings."));
}

#[test]
fn test_empty_directory() {
    let dir = project_dir();
    droidlint()
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No Android project files found."));
}

#[test]
fn test_interactive_requires_apply_fixes() {
    droidlint()
        .args([".", "--interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--apply-fixes"));
}
