//! Folio CLI Integration Tests
//!
//! Each test gets its own database in a temp dir and points `FOLIO_CONFIG`
//! at a file that does not exist, so the user's config is never read.
//!
//! ## Exit Codes
//! - 0: Success
//! - 1: Usage, config or storage failure

use std::path::Path;

use anyhow::Result;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

fn folio_command(dir: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("folio")?;
    cmd.env("FOLIO_CONFIG", dir.join("missing.toml"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--db").arg(dir.join("edits.db"));
    Ok(cmd)
}

fn set(dir: &Path, key: &str, original: &str, value: &str) -> Result<()> {
    folio_command(dir)?
        .args(["set", key, value, "--original", original])
        .assert()
        .success();
    Ok(())
}

#[test]
fn get_without_edit_prints_original() -> Result<()> {
    let dir = TempDir::new()?;
    folio_command(dir.path())?
        .args(["get", "overview.intro", "--original", "Hello world"])
        .assert()
        .success()
        .stdout("Hello world\n");
    Ok(())
}

#[test]
fn set_persists_across_invocations() -> Result<()> {
    let dir = TempDir::new()?;

    folio_command(dir.path())?
        .args(["set", "overview.intro", "Hello there", "--original", "Hello world"])
        .assert()
        .success()
        .stdout("overview.intro: modified\n");

    folio_command(dir.path())?
        .args(["get", "overview.intro", "--original", "Hello world"])
        .assert()
        .success()
        .stdout("Hello there\n");

    folio_command(dir.path())?
        .arg("list")
        .assert()
        .success()
        .stdout("overview.intro\n");
    Ok(())
}

#[test]
fn reset_restores_original() -> Result<()> {
    let dir = TempDir::new()?;
    set(dir.path(), "k", "O", "V")?;

    folio_command(dir.path())?
        .args(["reset", "k", "--original", "O", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""is_modified": false"#));

    folio_command(dir.path())?
        .arg("count")
        .assert()
        .success()
        .stdout("0\n");
    Ok(())
}

#[test]
fn list_content_round_trips_as_paragraphs() -> Result<()> {
    let dir = TempDir::new()?;
    let original = "Para one.\n\nPara two.";

    folio_command(dir.path())?
        .args([
            "set",
            "goals.body",
            "Para one.\n\nPara two.\n\nPara three.",
            "--list",
            "paragraphs",
            "--original",
            original,
        ])
        .assert()
        .success();

    let output = folio_command(dir.path())?
        .args([
            "get",
            "goals.body",
            "--list",
            "paragraphs",
            "--original",
            original,
            "--json",
        ])
        .output()?;
    assert!(output.status.success());

    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        json["items"],
        serde_json::json!(["Para one.", "Para two.", "Para three."])
    );
    assert_eq!(json["is_modified"], JsonValue::Bool(true));
    Ok(())
}

#[test]
fn export_writes_flat_json() -> Result<()> {
    let dir = TempDir::new()?;
    set(dir.path(), "a", "O", "1")?;
    set(dir.path(), "b", "O", "2")?;

    let output = folio_command(dir.path())?.arg("export").output()?;
    assert!(output.status.success());
    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json, serde_json::json!({"a": "1", "b": "2"}));

    let out_dir = dir.path().join("exports");
    std::fs::create_dir(&out_dir)?;
    folio_command(dir.path())?
        .args(["export", "--out"])
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Exported 2 edits"));
    assert!(out_dir.join("folio-edits.json").exists());
    Ok(())
}

#[test]
fn reset_all_asks_first() -> Result<()> {
    let dir = TempDir::new()?;
    set(dir.path(), "a", "O", "1")?;
    set(dir.path(), "b", "O", "2")?;

    folio_command(dir.path())?
        .arg("reset-all")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset all 2 edits? [y/N]"))
        .stdout(predicate::str::contains("Aborted."));

    folio_command(dir.path())?
        .arg("count")
        .assert()
        .stdout("2\n");

    folio_command(dir.path())?
        .args(["reset-all", "--yes"])
        .assert()
        .success()
        .stdout("Reset 2 edits.\n");

    folio_command(dir.path())?
        .arg("count")
        .assert()
        .stdout("0\n");
    Ok(())
}

#[test]
fn invalid_config_exits_1() -> Result<()> {
    let dir = TempDir::new()?;
    let config = dir.path().join("folio.toml");
    std::fs::write(&config, "key_prefix = \"bad:prefix\"\n")?;

    folio_command(dir.path())?
        .arg("--config")
        .arg(&config)
        .arg("count")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("key_prefix"));
    Ok(())
}

#[test]
fn missing_original_is_usage_error() -> Result<()> {
    let dir = TempDir::new()?;
    folio_command(dir.path())?
        .args(["get", "k"])
        .assert()
        .code(1);
    Ok(())
}
