//! Integration tests for the signage CLI

use assert_cmd::cargo;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{Value, json};
use signage_store_core::Session;
use signage_store_core::config::ConflictPolicy;
use signage_store_core::schema::{LayoutDraft, PlaylistDraft, Region};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Point the CLI at a private home directory and working directory
///
/// Running from a subdirectory keeps a `.signage.toml` in the repo from
/// leaking into the test.
fn set_home_env(cmd: &mut assert_cmd::Command, temp_dir: &TempDir) {
    let workdir = temp_dir.path().join("workdir");
    fs::create_dir_all(workdir.join(".git")).ok();
    cmd.env("SIGNAGE_HOME", temp_dir.path())
        .env_remove("SIGNAGE_STORE_ROOT")
        .env_remove("SIGNAGE_CONFLICT_POLICY")
        .env_remove("SIGNAGE_AUTO_MIGRATE")
        .env("SIGNAGE_LOG", "error")
        .current_dir(&workdir);
}

fn signage(temp_dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("signage");
    set_home_env(&mut cmd, temp_dir);
    cmd
}

fn default_root(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join(".config/signage/store")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Layout with two regions and one playlist using it
async fn seed_lobby(root: &Path) -> (String, String) {
    let session = Session::new(root, ConflictPolicy::Warn);
    let mut layout = LayoutDraft::new("Lobby layout");
    layout.regions = vec![
        Region::new("main", "Main", 0, 0, 1280, 1080),
        Region::new("side", "Side", 1280, 0, 640, 1080),
    ];
    let layout = session.layouts().create(layout).await.unwrap();

    let mut playlist = PlaylistDraft::new("Lobby loop");
    playlist.layout_id = Some(layout.id.clone());
    playlist.device = Some("lobby-1".to_string());
    let playlist = session.playlists().create(playlist).await.unwrap();
    (layout.id, playlist.id)
}

fn seed_legacy_content(root: &Path) {
    let dir = root.join("contents");
    fs::create_dir_all(&dir).unwrap();
    let stamp = "2025-06-01T08:00:00Z";
    let row = json!({"id": "old", "name": "Old page", "type": "website", "createdAt": stamp, "updatedAt": stamp});
    let mut detail = row.clone();
    detail["url"] = json!("https://example.com");
    fs::write(dir.join("index.json"), serde_json::to_string(&json!([row])).unwrap()).unwrap();
    fs::write(dir.join("content-old.json"), serde_json::to_string(&detail).unwrap()).unwrap();
}

#[test]
fn test_stats_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();

    signage(&temp_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(contains("contents").and(contains("schedules")))
        .stdout(contains("Total: 0 file(s)"));
}

#[tokio::test]
async fn test_list_and_show_records() {
    let temp_dir = TempDir::new().unwrap();
    let (layout_id, _) = seed_lobby(&default_root(&temp_dir)).await;

    signage(&temp_dir)
        .args(["list", "layouts"])
        .assert()
        .success()
        .stdout(contains(layout_id.as_str()).and(contains("Lobby layout")));

    let output = signage(&temp_dir)
        .args(["list", "layout", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows = stdout_json(&output);
    assert_eq!(rows[0]["regionCount"], 2);

    let output = signage(&temp_dir)
        .args(["show", "layouts", layout_id.as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let record = stdout_json(&output);
    assert_eq!(record["name"], "Lobby layout");
    assert_eq!(record["regions"][1]["id"], "side");
}

#[test]
fn test_show_missing_record_fails() {
    let temp_dir = TempDir::new().unwrap();

    signage(&temp_dir)
        .args(["show", "playlists", "nope"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn test_unknown_family_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();

    signage(&temp_dir)
        .args(["list", "devices"])
        .assert()
        .failure()
        .stderr(contains("unknown family"));
}

#[tokio::test]
async fn test_refs_reports_playlists() {
    let temp_dir = TempDir::new().unwrap();
    let (layout_id, playlist_id) = seed_lobby(&default_root(&temp_dir)).await;

    signage(&temp_dir)
        .args(["refs", "layout", layout_id.as_str()])
        .assert()
        .success()
        .stdout(contains("referenced 1 time(s)"))
        .stdout(contains(playlist_id.as_str()).and(contains("[lobby-1]")));

    let output = signage(&temp_dir)
        .args(["refs", "content", "unused-id", "--json"])
        .output()
        .unwrap();
    let usage = stdout_json(&output);
    assert_eq!(usage["isUsed"], false);
    assert_eq!(usage["usageCount"], 0);
}

#[test]
fn test_root_flag_overrides_home_default() {
    let temp_dir = TempDir::new().unwrap();
    let custom = temp_dir.path().join("custom-store");
    seed_legacy_content(&custom);

    signage(&temp_dir)
        .args(["migrate", "--check", "--root"])
        .arg(&custom)
        .assert()
        .success()
        .stdout(contains("Migration needed"));

    // The default root is untouched and empty
    signage(&temp_dir)
        .args(["migrate", "--check"])
        .assert()
        .success()
        .stdout(contains("Up to date"));
}

#[test]
fn test_migrate_then_check() {
    let temp_dir = TempDir::new().unwrap();
    seed_legacy_content(&default_root(&temp_dir));

    let output = signage(&temp_dir)
        .args(["migrate", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["migratedCount"], 1);

    signage(&temp_dir)
        .args(["migrate", "--check"])
        .assert()
        .success()
        .stdout(contains("Up to date"));

    let index: Value = serde_json::from_str(
        &fs::read_to_string(default_root(&temp_dir).join("contents/index.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(index[0]["type"], "url");
}

#[test]
fn test_auto_migrate_on_open_honors_env() {
    let temp_dir = TempDir::new().unwrap();
    seed_legacy_content(&default_root(&temp_dir));

    // Disabled: listing contents hits the legacy schema
    signage(&temp_dir)
        .env("SIGNAGE_AUTO_MIGRATE", "false")
        .args(["list", "contents"])
        .assert()
        .failure()
        .stderr(contains("Schema error"));

    // Default: migrated on open, then listed
    signage(&temp_dir)
        .args(["list", "contents"])
        .assert()
        .success()
        .stdout(contains("Old page"));
}

#[test]
fn test_sweep_dry_run_then_real() {
    let temp_dir = TempDir::new().unwrap();
    let root = default_root(&temp_dir);
    let stray = root.join("layouts/layout-orphan-1.json");
    fs::create_dir_all(stray.parent().unwrap()).unwrap();
    fs::write(&stray, "{}").unwrap();

    signage(&temp_dir)
        .args(["sweep", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("Would remove /layouts/layout-orphan-1.json"));
    assert!(stray.exists());

    let output = signage(&temp_dir)
        .args(["sweep", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["dryRun"], false);
    assert_eq!(report["removed"][0], "/layouts/layout-orphan-1.json");
    assert!(!stray.exists());
}
