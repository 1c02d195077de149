#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_dockerfile(root: &Path, dir: &str, content: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Dockerfile"), content).unwrap();
}

/// base-python (local-only) ← api、worker は独立
fn fixture() -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write_dockerfile(
        root,
        "base-python",
        "FROM ubuntu:22.04\nLABEL IMAGE=\"base-python\"\nLABEL REGISTRY=\"local-only\"\n",
    );
    write_dockerfile(
        root,
        "api",
        "FROM local-only/base-python:0.5.1\nLABEL IMAGE=\"api\"\nLABEL VERSION=\"1.2.0\"\n",
    );
    write_dockerfile(root, "worker", "FROM alpine:3.19\nLABEL IMAGE=\"worker\"\n");
    temp_dir
}

/// 設定ファイル・環境変数の影響を受けない ship コマンド
fn ship(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("SHIPFLOW_CONFIG_PATH")
        .env_remove("DEFAULT_REGISTRY")
        .env_remove("IMAGE_FILTER")
        .env_remove("CORE_IMAGES")
        .env_remove("BUILD_VERSION")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    ship(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    ship(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shipflow"));
}

#[test]
fn test_run_help() {
    let home = tempfile::tempdir().unwrap();
    ship(home.path())
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--images"))
        .stdout(predicate::str::contains("--no-push"))
        .stdout(predicate::str::contains("--allow-failures"));
}

#[test]
fn test_plan_whitelist_pulls_in_local_base() {
    let home = tempfile::tempdir().unwrap();
    let fixture = fixture();

    let output = ship(home.path())
        .args(["plan", "--images", "api", "--registry", "ghcr.io/acme/dist"])
        .arg("--root")
        .arg(fixture.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Build plan: 2 unit(s) | registry=ghcr.io/acme/dist"));
    assert!(stdout.contains("local-only/base-python:0.5.1"));
    assert!(stdout.contains("ghcr.io/acme/dist/api:1.2.0"));
    assert!(stdout.contains("(dependency)"));
    assert!(!stdout.contains("worker"));

    let base = stdout.find("local-only/base-python").unwrap();
    let api = stdout.find("ghcr.io/acme/dist/api").unwrap();
    assert!(base < api, "local-only base must be planned first:\n{}", stdout);
}

#[test]
fn test_plan_without_whitelist_lists_everything() {
    let home = tempfile::tempdir().unwrap();
    let fixture = fixture();

    ship(home.path())
        .arg("plan")
        .arg("--root")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build plan: 3 unit(s)"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("(dependency)").not());
}

#[test]
fn test_plan_filter_and_env_whitelist() {
    let home = tempfile::tempdir().unwrap();
    let fixture = fixture();

    ship(home.path())
        .env("CORE_IMAGES", "worker, ")
        .arg("plan")
        .arg("--root")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build plan: 1 unit(s)"))
        .stdout(predicate::str::contains("worker"));

    ship(home.path())
        .args(["plan", "--filter", "python"])
        .arg("--root")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build plan: 1 unit(s)"))
        .stdout(predicate::str::contains("base-python"));
}

#[test]
fn test_plan_unknown_image_is_empty() {
    let home = tempfile::tempdir().unwrap();
    let fixture = fixture();

    ship(home.path())
        .args(["plan", "--images", "does-not-exist"])
        .arg("--root")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build plan: 0 unit(s)"));
}

#[test]
fn test_plan_reads_config_file() {
    let home = tempfile::tempdir().unwrap();
    let fixture = fixture();
    fs::write(
        home.path().join("shipflow.kdl"),
        format!(
            "registry \"ghcr.io/from-kdl\"\nbuild-root \"{}\"\n",
            fixture.path().display()
        ),
    )
    .unwrap();

    ship(home.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("registry=ghcr.io/from-kdl"))
        .stdout(predicate::str::contains("ghcr.io/from-kdl/worker:0.5.1"));
}

#[test]
fn test_plan_missing_root_fails() {
    let home = tempfile::tempdir().unwrap();

    ship(home.path())
        .args(["plan", "--root"])
        .arg(home.path().join("missing"))
        .assert()
        .failure();
}

#[test]
fn test_invalid_command() {
    let home = tempfile::tempdir().unwrap();
    ship(home.path()).arg("deploy").assert().failure();
}
