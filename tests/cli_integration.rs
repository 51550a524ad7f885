#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn mdpages_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("mdpages"));
    cmd.env("MDPAGES_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("EDITOR")
        .env_remove("VISUAL");
    cmd
}

#[test]
fn fresh_home_lists_seeded_document() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Untitled"));

    assert!(home.path().join("documents.json").exists());
    assert!(home.path().join("activeDocumentId.json").exists());
}

#[test]
fn create_rename_and_show() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["new", "Notes", "--content", "# Groceries\n\n- milk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 'Notes'"));

    mdpages_cmd(&home)
        .args(["rename", "2", "Shopping"])
        .assert()
        .success();

    mdpages_cmd(&home)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shopping").and(predicate::str::contains("- milk")));
}

#[test]
fn edit_from_stdin_persists_active_document() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["edit", "--stdin"])
        .write_stdin("# Replaced\n\nfresh body")
        .assert()
        .success();

    mdpages_cmd(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("fresh body"));

    let raw = fs::read_to_string(home.path().join("documents.json")).unwrap();
    assert!(raw.contains("fresh body"));
    assert!(raw.contains("lastSavedAt"));
}

#[test]
fn removing_the_last_document_leaves_a_fresh_one() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["edit", "--stdin"])
        .write_stdin("to be discarded")
        .assert()
        .success();

    mdpages_cmd(&home).arg("rm").assert().success();

    mdpages_cmd(&home)
        .args(["show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("to be discarded").not());
}

#[test]
fn preview_writes_html_file() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("preview.html");
    mdpages_cmd(&home)
        .args(["new", "Page", "--content", "# Title\n\nBody"])
        .assert()
        .success();

    mdpages_cmd(&home)
        .args(["preview", "--out", out.to_str().unwrap()])
        .assert()
        .success();

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<h1>Title</h1>"));
}

#[test]
fn export_writes_pdf_named_after_document() {
    let home = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["new", "Trip", "--content", "# Day 1\n\nWalked along the river."])
        .assert()
        .success();

    mdpages_cmd(&home)
        .args(["export", "--strategy", "whole", "--format", "a5"])
        .args(["--out", out_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let pdf = fs::read(out_dir.path().join("Trip.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    mdpages_cmd(&home)
        .args(["export", "--artifact", "archive"])
        .args(["--out", out_dir.path().to_str().unwrap()])
        .assert()
        .success();
    assert!(out_dir.path().join("Trip.tar.gz").exists());
}

#[test]
fn config_round_trips_through_file() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["config", "page-format", "letter"])
        .assert()
        .success();

    mdpages_cmd(&home)
        .args(["config", "page-format"])
        .assert()
        .success()
        .stdout(predicate::str::contains("letter"));

    assert!(home.path().join("config.json").exists());
}

#[test]
fn unknown_selector_fails() {
    let home = TempDir::new().unwrap();
    mdpages_cmd(&home)
        .args(["use", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn legacy_single_document_is_migrated() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("content.json"), "\"# Legacy notes\"").unwrap();
    fs::write(home.path().join("lastSaved.json"), "\"2024-05-01T10:00:00Z\"").unwrap();

    mdpages_cmd(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Legacy notes"));

    assert!(!home.path().join("content.json").exists());
    assert!(!home.path().join("lastSaved.json").exists());
}
