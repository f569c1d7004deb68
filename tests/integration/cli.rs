//! Tests driving the `chromup` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::{Route, SnapshotServer, chrome_win_archive};

fn write_config(app_dir: &Path, base_url: &str) {
    fs::write(
        app_dir.join("chromup.toml"),
        format!("base_url = \"{base_url}\"\nplatform = \"win-x64\"\nconnect_timeout_secs = 5\n"),
    )
    .unwrap();
}

fn chromup(app_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("chromup").unwrap();
    cmd.env("CHROMUP_HOME", app_dir)
        .env("CHROMUP_NO_PROGRESS", "1")
        .env_remove("CHROMUP_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("chromup")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("reinstall"))
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn test_status_reports_both_revisions() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("1234567\n"));
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), server.base_url());

    chromup(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not installed"))
        .stdout(predicate::str::contains("1234567"));
}

#[test]
fn test_status_with_unreachable_server_shows_error_marker() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "http://127.0.0.1:9");
    fs::create_dir_all(temp.path().join("Chromium Stable x64")).unwrap();
    fs::write(temp.path().join("Chromium Stable x64/revision.log"), "42|Stable|x64").unwrap();

    chromup(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("42"))
        .stdout(predicate::str::contains("(error)"));
}

#[test]
fn test_update_installs_and_logs_nothing_on_success() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "555", "chrome-win.zip", chrome_win_archive("555"));
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), server.base_url());
    fs::write(
        temp.path().join("settings.ini"),
        "launchAfterUpdate=false\nautoUpdate=true\ncreateShortcuts=false\n",
    )
    .unwrap();

    chromup(temp.path())
        .args(["update", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("555"));

    let install = temp.path().join("Chromium Stable x64");
    assert_eq!(fs::read_to_string(install.join("revision.log")).unwrap(), "555|Stable|x64");
    assert!(install.join("chrome.exe").is_file());
    assert!(!install.join("chrome-win").exists());
    // Preferences are written back before the run.
    assert_eq!(
        fs::read_to_string(temp.path().join("settings.ini")).unwrap(),
        "launchAfterUpdate=false\nautoUpdate=true\ncreateShortcuts=false\n"
    );
}

#[test]
fn test_install_dir_override() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "77", "chrome-win.zip", chrome_win_archive("77"));
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), server.base_url());
    fs::write(temp.path().join("settings.ini"), "launchAfterUpdate=false\ncreateShortcuts=false\n").unwrap();

    chromup(temp.path())
        .args(["update", "-y", "--install-dir", "custom"])
        .assert()
        .success();

    assert!(temp.path().join("custom/revision.log").is_file());
    assert!(!temp.path().join("Chromium Stable x64").exists());
}

#[test]
fn test_startup_check_saves_preferences_before_installing() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "777", "chrome-win.zip", chrome_win_archive("777"));
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), server.base_url());
    // autoUpdate is left out and falls back to its default.
    fs::write(temp.path().join("settings.ini"), "launchAfterUpdate=false
createShortcuts=false
")
        .unwrap();

    chromup(temp.path())
        .args(["check", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("777"));

    assert_eq!(
        fs::read_to_string(temp.path().join("Chromium Stable x64/revision.log")).unwrap(),
        "777|Stable|x64"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("settings.ini")).unwrap(),
        "launchAfterUpdate=false\nautoUpdate=true\ncreateShortcuts=false\n"
    );
}

#[test]
fn test_failed_update_exits_nonzero_and_is_logged() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("31"));
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), server.base_url());

    chromup(temp.path())
        .args(["update", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));

    let log = fs::read_to_string(temp.path().join("chromup.log")).unwrap();
    assert!(log.contains("Update failed"), "log was: {log}");
}

#[test]
fn test_settings_round_trip() {
    let temp = TempDir::new().unwrap();

    chromup(temp.path())
        .args(["settings", "--auto-update", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved"));

    let content = fs::read_to_string(temp.path().join("settings.ini")).unwrap();
    assert!(content.contains("autoUpdate=false"));
    assert!(content.contains("launchAfterUpdate=true"));

    chromup(temp.path())
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("auto update:         false"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("chromup.toml"), "base_url = \"ftp://example.com\"\n").unwrap();

    chromup(temp.path()).arg("status").assert().failure().stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_shortcuts_require_an_installation() {
    let temp = TempDir::new().unwrap();

    chromup(temp.path())
        .arg("shortcuts")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}
