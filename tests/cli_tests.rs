//! End-to-end tests for the `terranotate` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Scratch directory holding the schema and a copy of one fixture module.
fn workspace(fixture: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::copy(fixtures_path().join("schema.yaml"), dir.path().join("schema.yaml")).unwrap();
    fs::create_dir(dir.path().join("infra")).unwrap();
    for entry in fs::read_dir(fixtures_path().join(fixture)).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join("infra").join(entry.file_name())).unwrap();
    }
    dir
}

fn terranotate(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("terranotate").unwrap();
    cmd.current_dir(dir)
        .env_remove("TERRANOTATE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("terranotate")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("revert"));
}

#[test]
fn test_validate_passes() {
    let dir = workspace("annotated");

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED - All resources have valid comments"));
}

#[test]
fn test_validate_fails_with_violations() {
    let dir = workspace("missing");

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("4 Errors | 0 Warnings"))
        .stdout(predicate::str::contains("Missing required comment prefix: @config"));
}

#[test]
fn test_validate_json_report_to_file() {
    let dir = workspace("values");

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--format", "json", "--output", "report.json"])
        .assert()
        .code(1);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report["passed"], false);
    assert_eq!(report["errors"][0]["kind"], "disallowed_value");
    assert_eq!(report["errors"][0]["value"], "testing");
}

#[test]
fn test_validate_missing_path() {
    let dir = workspace("annotated");

    terranotate(dir.path())
        .args(["validate", "nowhere", "schema.yaml"])
        .assert()
        .code(15)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_validate_bad_schema() {
    let dir = workspace("annotated");
    fs::write(dir.path().join("bad.yaml"), "global: [not, a, map]\n").unwrap();

    terranotate(dir.path())
        .args(["validate", "infra", "bad.yaml"])
        .assert()
        .code(19);
}

#[test]
fn test_validate_reports_skipped_files() {
    let dir = workspace("annotated");
    fs::copy(fixtures_path().join("broken/main.tf"), dir.path().join("infra/broken.tf")).unwrap();

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse HCL in"))
        .stderr(predicate::str::contains("broken.tf"))
        .stderr(predicate::str::contains("1 file(s) could not be parsed"));

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--fail-fast"])
        .assert()
        .code(17);
}

#[test]
fn test_parse_lists_resources() {
    let dir = workspace("annotated");

    terranotate(dir.path())
        .args(["parse", "infra/main.tf", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 resources in infra/main.tf"))
        .stdout(predicate::str::contains("aws_s3_bucket.logs"))
        .stdout(predicate::str::contains("Inline comments"));
}

#[test]
fn test_parse_json() {
    let dir = workspace("annotated");

    let output = terranotate(dir.path())
        .args(["parse", "infra/main.tf", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let resources: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resources[0]["type"], "aws_vpc");
    assert_eq!(resources[1]["preceding_comments"][1]["prefix"], "@config");
}

#[test]
fn test_fix_then_revert() {
    let dir = workspace("missing");
    let file = dir.path().join("infra/main.tf");
    let original = fs::read_to_string(&file).unwrap();

    terranotate(dir.path())
        .args(["fix", "infra", "schema.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 fix(es) applied"))
        .stdout(predicate::str::contains("Backup saved as"));

    assert!(dir.path().join("infra/main.tf.bak").exists());
    assert!(fs::read_to_string(&file)
        .unwrap()
        .starts_with("# @metadata owner:CHANGEME team:CHANGEME\nresource \"aws_vpc\" \"main\""));

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml"])
        .assert()
        .success();

    terranotate(dir.path())
        .args(["revert", "infra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) reverted"));

    assert_eq!(fs::read_to_string(&file).unwrap(), original);
    assert!(!dir.path().join("infra/main.tf.bak").exists());

    terranotate(dir.path())
        .args(["revert", "infra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backup files found to revert."));
}

#[test]
fn test_fix_dry_run_writes_nothing() {
    let dir = workspace("missing");
    let file = dir.path().join("infra/main.tf");
    let original = fs::read_to_string(&file).unwrap();

    terranotate(dir.path())
        .args(["fix", "infra", "schema.yaml", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would apply 4 fix(es)"));

    assert_eq!(fs::read_to_string(&file).unwrap(), original);
    assert!(!dir.path().join("infra/main.tf.bak").exists());
}

#[test]
fn test_generate_markdown() {
    let dir = workspace("annotated");

    terranotate(dir.path())
        .args(["generate", "infra", "schema.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# infra - Resource Documentation"))
        .stdout(predicate::str::contains("## aws_vpc"));

    terranotate(dir.path())
        .args(["generate", "infra", "schema.yaml", "--name", "network", "-o", "RESOURCES.md"])
        .assert()
        .success();
    let doc = fs::read_to_string(dir.path().join("RESOURCES.md")).unwrap();
    assert!(doc.starts_with("# network - Resource Documentation"));
}

#[test]
fn test_init_creates_examples_once() {
    let dir = TempDir::new().unwrap();

    terranotate(dir.path()).arg("init").assert().success();
    assert!(dir.path().join("terranotate.yaml").exists());
    assert!(dir.path().join("schema.yaml").exists());

    terranotate(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    terranotate(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn test_init_schema_is_usable() {
    let dir = workspace("annotated");
    fs::remove_file(dir.path().join("schema.yaml")).unwrap();

    terranotate(dir.path()).arg("init").assert().success();

    terranotate(dir.path())
        .args(["validate", "infra", "schema.yaml", "--no-color"])
        .assert()
        .stdout(predicate::str::contains("Terranotate Validation"));
}
