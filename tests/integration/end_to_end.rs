//! Full update runs against a local snapshot server.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chromup::config::UpdaterConfig;
use chromup::core::UpdateError;
use chromup::test_utils::init_test_logging;
use chromup::update::{
    InstalledState, ProcessProbe, Revision, RevisionStore, UpdateEvent, UpdateOrchestrator,
    UpdateOutcome, UpdatePhase, UpdateRequest, UserPrompt,
};
use tempfile::TempDir;

use crate::common::{Route, SnapshotServer, chrome_win_archive, tree, zip_archive};

struct NotRunning;

impl ProcessProbe for NotRunning {
    fn is_running(&self, _name: &str) -> bool {
        false
    }
}

struct Answer {
    yes: bool,
    asked: AtomicUsize,
}

impl Answer {
    fn new(yes: bool) -> Self {
        Self {
            yes,
            asked: AtomicUsize::new(0),
        }
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl UserPrompt for Answer {
    fn confirm_reinstall(&self, _revision: &Revision) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.yes
    }
}

fn config(server: &SnapshotServer) -> UpdaterConfig {
    UpdaterConfig {
        base_url: server.base_url().to_string(),
        connect_timeout_secs: 5,
        stall_timeout_secs: 10,
        ..UpdaterConfig::default()
    }
}

fn orchestrator(server: &SnapshotServer, root: &Path) -> UpdateOrchestrator {
    init_test_logging(None);
    UpdateOrchestrator::new(&config(server), root).unwrap().with_probe(Arc::new(NotRunning))
}

async fn marker(root: &Path) -> InstalledState {
    RevisionStore::new().read(root).await
}

#[tokio::test]
async fn test_fresh_install_lands_flat_and_writes_marker() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "555", "chrome-win.zip", chrome_win_archive("555"));
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Chromium Stable x64");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut orchestrator = orchestrator(&server, &root).with_events(tx);
    let prompt = Answer::new(false);

    let outcome = orchestrator.run(UpdateRequest::default(), &prompt).await.unwrap();

    let UpdateOutcome::Installed { revision, bytes, extracted, .. } = outcome else {
        panic!("expected an install, got {outcome:?}");
    };
    assert_eq!(revision.as_str(), "555");
    assert!(bytes > 0);
    assert_eq!(extracted.files, 5);
    assert_eq!(prompt.asked(), 0);
    assert_eq!(orchestrator.state().phase, UpdatePhase::Succeeded);

    assert_eq!(fs::read(root.join("chrome.exe")).unwrap(), b"chrome 555");
    assert_eq!(fs::read(root.join("locales/de.pak")).unwrap(), b"de");
    assert!(!root.join("chrome-win").exists());
    assert!(!root.join("chrome-win.zip").exists(), "archive is removed after extraction");
    assert_eq!(fs::read_to_string(root.join("revision.log")).unwrap(), "555|Stable|x64");
    assert_eq!(marker(&root).await, InstalledState::Installed("555".parse().unwrap()));

    drop(orchestrator);
    let mut phases = Vec::new();
    let mut percents = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            UpdateEvent::Phase(phase) => phases.push(phase),
            UpdateEvent::Download(progress) => percents.push(progress.percent().unwrap()),
            _ => {}
        }
    }
    assert_eq!(
        phases,
        vec![
            UpdatePhase::ResolvingVersions,
            UpdatePhase::PolicyCheck,
            UpdatePhase::Reclaiming,
            UpdatePhase::Downloading,
            UpdatePhase::Extracting,
            UpdatePhase::Finalizing,
            UpdatePhase::Succeeded,
        ]
    );
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_update_replaces_build_and_keeps_profile() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "600", "chrome-win.zip", chrome_win_archive("600"));
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    fs::create_dir_all(root.join("Profile/Default")).unwrap();
    fs::write(root.join("Profile/Default/Bookmarks"), b"bookmarks").unwrap();
    fs::write(root.join("stale.dll"), b"old").unwrap();
    fs::create_dir_all(root.join("old_locales")).unwrap();
    fs::write(root.join("revision.log"), "500|Stable|x64").unwrap();

    let mut orchestrator = orchestrator(&server, &root);
    let prompt = Answer::new(false);
    orchestrator.run(UpdateRequest::default(), &prompt).await.unwrap();

    assert_eq!(prompt.asked(), 0, "a different revision is installed without asking");
    assert_eq!(fs::read(root.join("Profile/Default/Bookmarks")).unwrap(), b"bookmarks");
    assert!(!root.join("stale.dll").exists());
    assert!(!root.join("old_locales").exists());
    assert_eq!(marker(&root).await, InstalledState::Installed("600".parse().unwrap()));
}

#[tokio::test]
async fn test_forced_reinstall_never_writes_into_profile() {
    let server = SnapshotServer::start();
    let archive = zip_archive(&[
        ("chrome-win/chrome.exe", Some(b"chrome 700")),
        ("chrome-win/profile/Default/Bookmarks", Some(b"shipped")),
    ]);
    server.publish("Win_x64", "700", "chrome-win.zip", archive);
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    fs::create_dir_all(root.join("profile/Default")).unwrap();
    fs::write(root.join("profile/Default/Bookmarks"), b"mine").unwrap();
    fs::write(root.join("revision.log"), "700|Stable|x64").unwrap();

    let outcome = orchestrator(&server, &root)
        .run(UpdateRequest { force: true }, &Answer::new(false))
        .await
        .unwrap();

    match outcome {
        UpdateOutcome::Installed { extracted, .. } => assert_eq!(extracted.skipped, 1),
        other => panic!("Expected Installed, got {other:?}"),
    }
    assert_eq!(fs::read(root.join("profile/Default/Bookmarks")).unwrap(), b"mine");
    assert_eq!(fs::read(root.join("chrome.exe")).unwrap(), b"chrome 700");
}

#[tokio::test]
async fn test_declined_reinstall_downloads_nothing() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "555", "chrome-win.zip", chrome_win_archive("555"));
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    orchestrator(&server, &root).run(UpdateRequest::default(), &Answer::new(false)).await.unwrap();
    fs::create_dir_all(root.join("profile")).unwrap();
    fs::write(root.join("profile/Local State"), b"state").unwrap();
    let before = tree(&root);

    let prompt = Answer::new(false);
    let outcome = orchestrator(&server, &root).run(UpdateRequest::default(), &prompt).await.unwrap();

    assert_eq!(prompt.asked(), 1);
    assert!(matches!(outcome, UpdateOutcome::Declined { .. }));
    assert_eq!(tree(&root), before);
    let archive_hits = server.hits().iter().filter(|p| p.ends_with("chrome-win.zip")).count();
    assert_eq!(archive_hits, 1, "only the first run downloads");
}

#[tokio::test]
async fn test_forced_reinstall_restores_deleted_files() {
    let server = SnapshotServer::start();
    server.publish("Win_x64", "555", "chrome-win.zip", chrome_win_archive("555"));
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    orchestrator(&server, &root).run(UpdateRequest::default(), &Answer::new(false)).await.unwrap();
    let installed = tree(&root);
    fs::remove_file(root.join("chrome.dll")).unwrap();

    let prompt = Answer::new(false);
    let outcome = orchestrator(&server, &root).run(UpdateRequest { force: true }, &prompt).await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Installed { .. }));
    assert_eq!(prompt.asked(), 0);
    assert_eq!(tree(&root), installed);
}

#[tokio::test]
async fn test_missing_content_length_is_tolerated() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("777"));
    server.route("/Win_x64/777/chrome-win.zip", Route::ok(chrome_win_archive("777")).without_length());
    let temp = TempDir::new().unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut orchestrator = orchestrator(&server, temp.path()).with_events(tx);
    orchestrator.run(UpdateRequest::default(), &Answer::new(false)).await.unwrap();
    drop(orchestrator);

    let mut downloads = 0;
    while let Some(event) = rx.recv().await {
        if let UpdateEvent::Download(progress) = event {
            downloads += 1;
            assert_eq!(progress.bytes_total, None);
            assert_eq!(progress.percent(), None);
            assert_eq!(progress.eta(), None);
        }
    }
    assert!(downloads > 0);
    assert_eq!(fs::read(temp.path().join("chrome.exe")).unwrap(), b"chrome 777");
}

#[tokio::test]
async fn test_unresolved_revision_is_a_hard_failure() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::status(503));
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("chrome.exe"), b"keep me").unwrap();

    let mut orchestrator = orchestrator(&server, temp.path());
    let error = orchestrator.run(UpdateRequest::default(), &Answer::new(true)).await.unwrap_err();

    assert!(matches!(error, UpdateError::HttpStatus { status: 503, .. }));
    assert_eq!(orchestrator.state().phase, UpdatePhase::Failed);
    assert_eq!(fs::read(temp.path().join("chrome.exe")).unwrap(), b"keep me");
}

#[tokio::test]
async fn test_garbage_last_change_is_unresolved() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("<html>not a revision</html>"));
    let temp = TempDir::new().unwrap();

    let error = orchestrator(&server, temp.path())
        .run(UpdateRequest::default(), &Answer::new(true))
        .await
        .unwrap_err();

    assert!(matches!(error, UpdateError::RevisionUnresolved { .. }));
}

#[tokio::test]
async fn test_missing_archive_fails_without_marker() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("888"));
    let temp = TempDir::new().unwrap();

    let error = orchestrator(&server, temp.path())
        .run(UpdateRequest::default(), &Answer::new(true))
        .await
        .unwrap_err();

    assert!(matches!(error, UpdateError::HttpStatus { status: 404, .. }));
    assert_eq!(marker(temp.path()).await, InstalledState::Absent);
}

#[tokio::test]
async fn test_corrupt_archive_fails_without_marker() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok("889"));
    server.route("/Win_x64/889/chrome-win.zip", Route::ok(b"PK but not really".to_vec()));
    let temp = TempDir::new().unwrap();

    let mut orchestrator = orchestrator(&server, temp.path());
    let error = orchestrator.run(UpdateRequest::default(), &Answer::new(true)).await.unwrap_err();

    assert!(matches!(error, UpdateError::Extraction { .. }));
    assert_eq!(orchestrator.state().phase, UpdatePhase::Failed);
    assert_eq!(marker(temp.path()).await, InstalledState::Absent);
}

#[tokio::test]
async fn test_escaping_entry_aborts_extraction() {
    let server = SnapshotServer::start();
    let archive = zip_archive(&[
        ("chrome-win/chrome.exe", Some(b"exe")),
        ("chrome-win/../../outside.txt", Some(b"escape")),
    ]);
    server.publish("Win_x64", "990", "chrome-win.zip", archive);
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");

    let error = orchestrator(&server, &root)
        .run(UpdateRequest::default(), &Answer::new(true))
        .await
        .unwrap_err();

    assert!(matches!(error, UpdateError::UnsafeArchiveEntry { .. }));
    assert!(!temp.path().join("outside.txt").exists());
    assert_eq!(marker(&root).await, InstalledState::Absent);
}

#[tokio::test]
async fn test_refresh_and_update_available() {
    let server = SnapshotServer::start();
    server.route("/Win_x64/LAST_CHANGE", Route::ok(" 1200\r\n"));
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("revision.log"), "1100|Stable|x64").unwrap();

    let mut orchestrator = orchestrator(&server, temp.path());
    assert!(!orchestrator.update_available(), "nothing known yet");

    orchestrator.refresh_installed().await;
    let latest = orchestrator.refresh_remote().await.unwrap();

    assert_eq!(latest.as_str(), "1200");
    assert!(orchestrator.update_available());
}
