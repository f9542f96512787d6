//! Command-line behavior that needs no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn ocrflow() -> Command {
    let mut cmd = Command::cargo_bin("ocrflow").unwrap();
    cmd.env_remove("OCRFLOW_OCR_APP_ID")
        .env_remove("OCRFLOW_OCR_APP_KEY")
        .env_remove("OCRFLOW_OCR_ENDPOINT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn initialized_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    ocrflow()
        .args(["init", "--dir"])
        .arg(dir.path())
        .assert()
        .success();
    dir
}

fn write_image(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, [0x89, 0x50, 0x4E, 0x47]).unwrap();
    path
}

#[test]
fn test_init_creates_project() {
    let dir = tempfile::tempdir().unwrap();

    ocrflow()
        .args(["init", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"))
        .stdout(predicate::str::contains("agents/vision.md"));

    assert!(dir.path().join(".ocrflow/config.toml").exists());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let dir = initialized_project();

    ocrflow()
        .args(["init", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    ocrflow()
        .args(["init", "--force", "--minimal", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("agents/vision.md").not());
}

#[test]
fn test_agents_lists_roles() {
    let dir = initialized_project();

    ocrflow()
        .args(["agents", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("compiler"))
        .stdout(predicate::str::contains("[responder]"))
        .stdout(predicate::str::contains("[unused]"));
}

#[test]
fn test_agents_without_project() {
    let dir = tempfile::tempdir().unwrap();

    ocrflow()
        .args(["agents", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No agents configured"));
}

#[test]
fn test_check_reports_problems() {
    let dir = initialized_project();

    ocrflow()
        .args(["check", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Add at least one image"))
        .stdout(predicate::str::contains("OCR credentials are missing"));
}

#[test]
fn test_check_passes_with_credentials_and_image() {
    let dir = initialized_project();
    let image = write_image(dir.path(), "page.png");

    ocrflow()
        .env("OCRFLOW_OCR_APP_ID", "id")
        .env("OCRFLOW_OCR_APP_KEY", "key")
        .args(["check", "--dir"])
        .arg(dir.path())
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("ready to run"));
}

#[test]
fn test_run_requires_images() {
    ocrflow().arg("run").assert().failure();
}

#[test]
fn test_run_missing_image_file() {
    let dir = initialized_project();

    ocrflow()
        .args(["run", "--dir"])
        .arg(dir.path())
        .arg(dir.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read image"));
}

#[test]
fn test_run_stops_on_invalid_configuration() {
    let dir = initialized_project();
    let image = write_image(dir.path(), "page.png");

    ocrflow()
        .args(["run", "--dir"])
        .arg(dir.path())
        .arg(&image)
        .assert()
        .failure()
        .stdout(predicate::str::contains("OCR credentials are missing"))
        .stderr(predicate::str::contains("cannot start the workflow"));
}
