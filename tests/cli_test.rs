//! CLI integration tests
//!
//! End-to-end tests for the imgtag command-line interface. Each test runs
//! in its own temp directory with an explicit `--root` and `--db`.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the imgtag binary
fn imgtag() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("imgtag").expect("Failed to find imgtag binary")
}

/// Temp directory with `pics/` holding a couple of images
fn setup_library() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pics = dir.path().join("pics");
    fs::create_dir_all(pics.join("2024")).expect("Failed to create pics dir");
    fs::write(pics.join("cat.jpg"), b"").expect("Failed to write image");
    fs::write(pics.join("2024/dog.png"), b"").expect("Failed to write image");
    dir
}

/// Command bound to the library in `dir`
fn in_library(dir: &Path) -> Command {
    let mut cmd = imgtag();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("IMGTAG_DB")
        .env_remove("IMGTAG_ROOT")
        .args(["--root", "pics", "--db", "tags.db"]);
    cmd
}

#[test]
fn test_help_output() {
    imgtag()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tag images"));
}

#[test]
fn test_version_output() {
    imgtag()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("imgtag"));
}

#[test]
fn test_missing_root_fails_fast() {
    let dir = TempDir::new().unwrap();
    imgtag()
        .current_dir(dir.path())
        .env_remove("IMGTAG_ROOT")
        .args(["--root", "does-not-exist", "list-tags"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert!(!dir.path().join("imgtag.db").exists());
}

#[test]
#[serial]
fn test_list_tags_table() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "cat.jpg", "animal", "Outdoor"])
        .assert()
        .success();
    in_library(dir.path())
        .args(["tag", "dog.png", "animal"])
        .assert()
        .success();

    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stdout("Tag                  # Files\nanimal               2\noutdoor              1\n");
}

#[test]
fn test_list_tags_empty_database() {
    let dir = setup_library();
    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stdout("Tag                  # Files\n");
    assert!(dir.path().join("tags.db").exists());
}

#[test]
fn test_query_and_exclude() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "cat.jpg", "animal", "indoor"])
        .assert()
        .success();
    in_library(dir.path())
        .args(["tag", "dog.png", "animal"])
        .assert()
        .success();

    in_library(dir.path())
        .args(["query", "animal", "-indoor"])
        .assert()
        .success()
        .stdout("dog.png\n");

    in_library(dir.path())
        .args(["query", "animal"])
        .assert()
        .success()
        .stdout("cat.jpg\ndog.png\n");
}

#[test]
fn test_query_without_include_fails() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["query", "-animal"])
        .assert()
        .failure();
}

#[test]
fn test_tags_and_untag() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "cat.jpg", "animal", "cute"])
        .assert()
        .success();
    in_library(dir.path())
        .args(["untag", "cat.jpg", "cute", "never-there"])
        .assert()
        .success();
    in_library(dir.path())
        .args(["tags", "cat.jpg"])
        .assert()
        .success()
        .stdout("animal (1)\n");
}

#[test]
fn test_resolve_finds_and_prunes() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "ghost.jpg", "animal"])
        .assert()
        .success();

    in_library(dir.path())
        .args(["resolve", "dog.png", "ghost.jpg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024").and(predicate::str::contains("dog.png")))
        .stdout(predicate::str::contains("ghost.jpg\t(not found, removed)"));

    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("animal               0"));
}

#[test]
fn test_reset_confirmed() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "cat.jpg", "animal"])
        .assert()
        .success();

    in_library(dir.path())
        .arg("reset")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Are you sure? [y/n]"));

    assert!(dir.path().join("tags.db.back").exists());
    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stdout("Tag                  # Files\n");
}

#[test]
fn test_reset_aborted() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["tag", "cat.jpg", "animal"])
        .assert()
        .success();

    in_library(dir.path())
        .arg("reset")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout("Aborting\n");

    assert!(!dir.path().join("tags.db.back").exists());
    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("animal"));
}

#[test]
fn test_reset_aborted_leaves_database_alone() {
    let dir = setup_library();
    in_library(dir.path())
        .arg("reset")
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout("Aborting\n");

    assert!(!dir.path().join("tags.db").exists());
    assert!(!dir.path().join("tags.db.back").exists());
}

#[test]
fn test_reset_yes_skips_prompt() {
    let dir = setup_library();
    in_library(dir.path())
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Are you sure").not());
    assert!(dir.path().join("tags.db.back").exists());
}

#[test]
fn test_cleanup_is_noop() {
    let dir = setup_library();
    in_library(dir.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_project_config_file() {
    let dir = setup_library();
    fs::write(
        dir.path().join("imgtag.toml"),
        "[database]\nfilename = \"from-config.db\"\n\n[filesystem]\nroot_dir = \"pics\"\n",
    )
    .unwrap();

    imgtag()
        .current_dir(dir.path())
        .env_remove("IMGTAG_DB")
        .env_remove("IMGTAG_ROOT")
        .arg("list-tags")
        .assert()
        .success();
    assert!(dir.path().join("from-config.db").exists());
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = setup_library();
    fs::write(dir.path().join("imgtag.toml"), "[cache\nttl_secs = ").unwrap();

    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed to parse config"))
        .stdout("Tag                  # Files\n");
}

#[test]
fn test_configured_log_level_applies() {
    let dir = setup_library();
    fs::write(dir.path().join("imgtag.toml"), "[logging]\nlevel = \"error\"\n").unwrap();

    in_library(dir.path())
        .arg("list-tags")
        .assert()
        .success()
        .stderr(predicate::str::contains("Database connected").not());
}
