//! The update state machine.
//!
//! ```text
//! Idle -> ResolvingVersions -> PolicyCheck -> Reclaiming -> Downloading
//!      -> Extracting -> Finalizing -> Succeeded | Failed
//! ```
//!
//! The orchestrator owns the [`UpdateState`]; nothing else mutates it. Progress
//! and status travel to the presentation layer over a single unbounded channel
//! of [`UpdateEvent`]s, which is the only thing shared with the caller while a
//! run is in flight. Filesystem-heavy steps (reclaim, extraction) and the
//! process-table scan run on blocking workers.
//!
//! At most one run is expected at a time; `run` takes `&mut self` so the
//! borrow checker enforces that for a single orchestrator.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::config::UpdaterConfig;
use crate::constants::USER_AGENT;
use crate::core::UpdateError;
use crate::update::download::{Downloader, TransferProgress};
use crate::update::extract::{ArchiveInstaller, ExtractionProgress, ExtractionReport};
use crate::update::process::{ProcessProbe, SystemProcessProbe};
use crate::update::reclaim::{InstallSpaceReclaimer, ReclaimReport};
use crate::update::remote::{RemoteState, RemoteVersionResolver};
use crate::update::revision::{InstalledState, Revision, RevisionMarker, RevisionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
    #[default]
    Idle,
    ResolvingVersions,
    PolicyCheck,
    Reclaiming,
    Downloading,
    Extracting,
    Finalizing,
    Succeeded,
    Failed,
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::ResolvingVersions => "resolving versions",
            Self::PolicyCheck => "checking policy",
            Self::Reclaiming => "removing old version",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Notification for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Phase(UpdatePhase),
    Download(TransferProgress),
    Extract(ExtractionProgress),
    Status(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateState {
    pub installed: InstalledState,
    pub remote: RemoteState,
    pub phase: UpdatePhase,
}

impl UpdateState {
    /// Pure inequality: any resolved remote revision that differs from the
    /// installed one is an update, including an older one.
    pub fn update_available(&self) -> bool {
        match (self.installed.revision(), self.remote.revision()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(installed), Some(remote)) => installed != remote,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Reinstall without asking when the remote revision is already installed.
    pub force: bool,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Installed {
        revision: Revision,
        bytes: u64,
        reclaimed: ReclaimReport,
        extracted: ExtractionReport,
    },
    /// The revision was already installed and the user chose not to reinstall.
    Declined { revision: Revision },
    /// The browser is running; nothing was touched.
    Blocked { process: String },
}

/// Confirmation asked from the user during the policy check.
///
/// May block (e.g. on stdin).
pub trait UserPrompt: Send + Sync {
    /// Revision `revision` is already installed; reinstall it anyway?
    fn confirm_reinstall(&self, revision: &Revision) -> bool;
}

/// Build the shared HTTP client with the configured connect timeout.
pub fn http_client(config: &UpdaterConfig) -> Result<reqwest::Client, UpdateError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if config.connect_timeout_secs > 0 {
        builder = builder.connect_timeout(config.connect_timeout());
    }
    builder.build().map_err(|e| UpdateError::Network {
        operation: "initialise HTTP client".to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
struct EventSink(Option<UnboundedSender<UpdateEvent>>);

impl EventSink {
    fn emit(&self, event: UpdateEvent) {
        if let Some(sender) = &self.0 {
            // A closed receiver only means nobody is watching any more.
            let _ = sender.send(event);
        }
    }
}

pub struct UpdateOrchestrator {
    config: UpdaterConfig,
    install_dir: PathBuf,
    resolver: RemoteVersionResolver,
    downloader: Downloader,
    store: RevisionStore,
    reclaimer: InstallSpaceReclaimer,
    installer: ArchiveInstaller,
    probe: Arc<dyn ProcessProbe>,
    events: EventSink,
    state: UpdateState,
}

impl UpdateOrchestrator {
    pub fn new(config: &UpdaterConfig, install_dir: impl Into<PathBuf>) -> Result<Self, UpdateError> {
        let client = http_client(config)?;
        Ok(Self::with_client(config, install_dir, client))
    }

    pub fn with_client(
        config: &UpdaterConfig,
        install_dir: impl Into<PathBuf>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            resolver: RemoteVersionResolver::new(client.clone(), config.last_change_url()),
            downloader: Downloader::new(client).with_stall_timeout(config.stall_timeout()),
            store: RevisionStore::new(),
            reclaimer: InstallSpaceReclaimer::new(config.preserve_dir.clone()),
            installer: ArchiveInstaller::new(config.platform.archive_prefix())
                .with_preserve(config.preserve_dir.clone()),
            probe: Arc::new(SystemProcessProbe),
            events: EventSink::default(),
            state: UpdateState::default(),
            install_dir: install_dir.into(),
            config: config.clone(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_events(mut self, sender: UnboundedSender<UpdateEvent>) -> Self {
        self.events = EventSink(Some(sender));
        self
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn update_available(&self) -> bool {
        self.state.update_available()
    }

    /// Re-read the marker file.
    pub async fn refresh_installed(&mut self) -> &InstalledState {
        self.state.installed = self.store.read(&self.install_dir).await;
        &self.state.installed
    }

    /// Query the remote endpoint. On failure the remote state becomes
    /// `Unresolved` and the error is returned.
    pub async fn refresh_remote(&mut self) -> Result<Revision, UpdateError> {
        match self.resolver.resolve_latest().await {
            Ok(revision) => {
                self.state.remote = RemoteState::Resolved(revision.clone());
                Ok(revision)
            }
            Err(e) => {
                self.state.remote = RemoteState::Unresolved;
                Err(e)
            }
        }
    }

    /// Execute one update run.
    ///
    /// `Ok` covers successful installs as well as policy aborts; `Err` means
    /// the run reached `Failed`.
    pub async fn run(
        &mut self,
        request: UpdateRequest,
        prompt: &dyn UserPrompt,
    ) -> Result<UpdateOutcome, UpdateError> {
        self.set_phase(UpdatePhase::ResolvingVersions);
        self.refresh_installed().await;
        let remote = match self.state.remote.revision() {
            Some(revision) => revision.clone(),
            None => match self.refresh_remote().await {
                Ok(revision) => revision,
                Err(e) => return Err(self.fail(e)),
            },
        };

        self.set_phase(UpdatePhase::PolicyCheck);
        let already_installed = self.state.installed.revision() == Some(&remote);
        if already_installed && !request.force {
            debug!(revision = %remote, "Revision already installed, asking for confirmation");
            if !prompt.confirm_reinstall(&remote) {
                info!(revision = %remote, "Reinstall declined");
                self.set_phase(UpdatePhase::Idle);
                return Ok(UpdateOutcome::Declined { revision: remote });
            }
        }

        let process = self.config.platform.process_name().to_string();
        if self.target_running(&process).await {
            warn!(%process, "Browser is running; close it before updating");
            self.events.emit(UpdateEvent::Status(format!("Close {process} before updating")));
            self.set_phase(UpdatePhase::Idle);
            return Ok(UpdateOutcome::Blocked { process });
        }

        match self.install(&remote).await {
            Ok(outcome) => {
                self.set_phase(UpdatePhase::Succeeded);
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn install(&mut self, revision: &Revision) -> Result<UpdateOutcome, UpdateError> {
        self.set_phase(UpdatePhase::Reclaiming);
        let reclaimer = self.reclaimer.clone();
        let root = self.install_dir.clone();
        let reclaimed = tokio::task::spawn_blocking(move || reclaimer.clear(&root))
            .await
            .map_err(join_error)??;
        if !reclaimed.is_clean() {
            warn!(failures = reclaimed.failures.len(), "Some stale entries could not be removed");
        }

        self.set_phase(UpdatePhase::Downloading);
        tokio::fs::create_dir_all(&self.install_dir)
            .await
            .map_err(|e| UpdateError::file_system("create installation directory", &self.install_dir, &e))?;
        let archive = self.install_dir.join(self.config.platform.archive_name());
        let url = self.config.archive_url(revision);
        self.events.emit(UpdateEvent::Status(format!("Downloading revision {revision}")));

        let sink = self.events.clone();
        let bytes = self
            .downloader
            .download(&url, &archive, move |progress| sink.emit(UpdateEvent::Download(*progress)))
            .await?;

        self.set_phase(UpdatePhase::Extracting);
        let installer = self.installer.clone();
        let sink = self.events.clone();
        let root = self.install_dir.clone();
        let archive_path = archive.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            installer.extract(&archive_path, &root, |progress| sink.emit(UpdateEvent::Extract(progress)))
        })
        .await
        .map_err(join_error)??;

        self.set_phase(UpdatePhase::Finalizing);
        if let Err(e) = tokio::fs::remove_file(&archive).await {
            warn!(path = %archive.display(), error = %e, "Failed to remove downloaded archive");
        }

        let marker = RevisionMarker::new(
            revision.clone(),
            self.config.channel.clone(),
            self.config.platform.architecture(),
        );
        if let Err(e) = self.store.write(&self.install_dir, &marker).await {
            warn!(error = %e, "Installed, but the revision marker could not be written");
        }
        self.state.installed = InstalledState::Installed(revision.clone());

        info!(%revision, bytes, files = extracted.files, "Update installed");
        self.events.emit(UpdateEvent::Status(format!("Revision {revision} installed")));

        Ok(UpdateOutcome::Installed {
            revision: revision.clone(),
            bytes,
            reclaimed,
            extracted,
        })
    }

    async fn target_running(&self, process: &str) -> bool {
        let probe = Arc::clone(&self.probe);
        let name = process.to_string();
        match tokio::task::spawn_blocking(move || probe.is_running(&name)).await {
            Ok(running) => running,
            Err(e) => {
                warn!(error = %e, "Process check did not complete; assuming not running");
                false
            }
        }
    }

    fn set_phase(&mut self, phase: UpdatePhase) {
        debug!(%phase, "Update phase");
        self.state.phase = phase;
        self.events.emit(UpdateEvent::Phase(phase));
    }

    fn fail(&mut self, error: UpdateError) -> UpdateError {
        error!(error = %error, "Update failed");
        self.set_phase(UpdatePhase::Failed);
        error
    }
}

fn join_error(e: tokio::task::JoinError) -> UpdateError {
    UpdateError::Other {
        message: format!("background task failed: {e}"),
    }
}
