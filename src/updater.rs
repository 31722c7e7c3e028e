//! Startup self-update orchestration.
//!
//! One session per process lifetime: check the published version, count
//! down, pull the updater artifact to the temp directory, and hand
//! execution off to it. A failed check must never block normal operation,
//! so every failure path lands back on [`UpdateOutcome::UpToDate`].

use crate::config::UpdateConfig;
use crate::download;
use crate::error::{AgentError, Result};
use crate::platform;
use crate::status::StatusSink;
use crate::version::{Version, VersionOracle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Phases of one update session, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    UpToDate,
    Stale,
    CountingDown,
    Downloading,
    Launching,
    Terminated,
    Failed,
}

/// What the caller must do after the startup check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Keep running the current version. Also the landing spot for every
    /// failure path.
    UpToDate,
    /// The updater was spawned; the current process must exit now so two
    /// instances never overlap.
    ExitRequired {
        /// Path of the spawned updater artifact.
        updater: PathBuf,
    },
}

/// Hook that starts the downloaded artifact. The default requests elevation
/// via [`platform::spawn_elevated`]; tests and presentation shells may
/// substitute their own.
pub type SpawnHook = Box<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Orchestrates the version oracle and download engine for one session.
pub struct UpdateLauncher {
    config: UpdateConfig,
    client: reqwest::Client,
    status: StatusSink,
    cancel: CancellationToken,
    current: Option<Version>,
    spawn_hook: SpawnHook,
}

impl UpdateLauncher {
    /// Create a launcher for the running build's version.
    pub fn new(
        config: UpdateConfig,
        client: reqwest::Client,
        status: StatusSink,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            status,
            cancel,
            current: Version::current(),
            spawn_hook: Box::new(|path| platform::spawn_elevated(path)),
        }
    }

    /// Override the running version (the default comes from the build).
    pub fn with_current_version(mut self, current: Version) -> Self {
        self.current = Some(current);
        self
    }

    /// Override the artifact spawn step.
    pub fn with_spawn_hook(mut self, hook: SpawnHook) -> Self {
        self.spawn_hook = hook;
        self
    }

    /// Destination of the downloaded artifact, overwritten on each attempt.
    pub fn artifact_path(&self) -> PathBuf {
        std::env::temp_dir().join(&self.config.updater_filename)
    }

    /// Run the startup update session. Call once per process lifetime.
    ///
    /// Never fails past this boundary: check failures degrade silently to
    /// `UpToDate`, download/launch failures leave one status line and also
    /// return `UpToDate`, cancellation aborts with the idle status restored.
    pub async fn run_startup_check(&self) -> UpdateOutcome {
        match self.run_session().await {
            Ok(outcome) => outcome,
            Err(AgentError::Cancelled) => {
                debug!("update session aborted by shutdown");
                self.status.clear();
                UpdateOutcome::UpToDate
            }
            Err(e) => {
                warn!(phase = ?UpdatePhase::Failed, "update session failed: {e}");
                self.status.set_text(format!("Update failed: {e}"));
                UpdateOutcome::UpToDate
            }
        }
    }

    async fn run_session(&self) -> Result<UpdateOutcome> {
        debug!(phase = ?UpdatePhase::Checking, "update session started");
        self.status.set_text("Checking for updates…");

        let oracle = VersionOracle::new(self.client.clone(), &self.config.version_url)
            .with_timeout(self.config.request_timeout());
        let latest = match oracle.fetch_latest(&self.cancel).await {
            Ok(latest) => latest,
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(e) => {
                // Fail-open: a broken or unreachable check is a skipped
                // check, not a stop.
                debug!("update check skipped: {e}");
                self.status.clear();
                return Ok(UpdateOutcome::UpToDate);
            }
        };

        if !remote_is_newer(&latest, self.current.as_ref()) {
            debug!(phase = ?UpdatePhase::UpToDate, "remote {latest} is not newer; staying put");
            self.status.clear();
            return Ok(UpdateOutcome::UpToDate);
        }

        info!(phase = ?UpdatePhase::Stale, "version {latest} available");
        self.countdown().await?;

        let destination = self.artifact_path();
        self.download_updater(&destination).await?;
        if !destination.exists() {
            return Err(AgentError::MissingExecutable(
                destination.display().to_string(),
            ));
        }

        debug!(phase = ?UpdatePhase::Launching, "starting updater at {}", destination.display());
        self.status.set_text("Launching updater…");
        (self.spawn_hook)(&destination)?;

        info!(phase = ?UpdatePhase::Terminated, "updater running; current process must exit");
        Ok(UpdateOutcome::ExitRequired {
            updater: destination,
        })
    }

    async fn countdown(&self) -> Result<()> {
        debug!(phase = ?UpdatePhase::CountingDown, ticks = self.config.countdown_ticks, "starting countdown");
        for remaining in (0..self.config.countdown_ticks).rev() {
            self.status.set_text(format!("Updating in {remaining} s…"));
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(AgentError::Cancelled),
                () = sleep(Duration::from_secs(1)) => {}
            }
        }
        Ok(())
    }

    async fn download_updater(&self, destination: &Path) -> Result<()> {
        debug!(phase = ?UpdatePhase::Downloading, url = %self.config.updater_url, "downloading updater");
        self.status.set_text("Downloading updater…");

        let status = self.status.clone();
        download::download(
            &self.client,
            &self.config.updater_url,
            destination,
            &move |pct| status.set_progress(pct),
            &self.cancel,
        )
        .await
    }
}

/// Staleness gate. Without a known running version there is no baseline to
/// beat, so the remote is never treated as newer and the check is skipped.
fn remote_is_newer(latest: &Version, current: Option<&Version>) -> bool {
    match current {
        Some(current) => latest.is_newer_than(current),
        None => {
            warn!("running version unknown; skipping update check");
            false
        }
    }
}
