//! Public facade wired by the presentation layer.
//!
//! The window/UI code talks to [`SupportAgent`] only: the update check at
//! startup, the relaunch action on user request, and the shutdown hook when
//! closing. No error ever crosses these entry points; failures become
//! status text on the snapshot channel handed out by [`SupportAgent::new`].

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::platform;
use crate::status::{StatusSink, StatusSnapshot};
use crate::supervisor::{self, RelaunchOutcome};
use crate::updater::{UpdateLauncher, UpdateOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Presentation-facing result of a relaunch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaunchReport {
    /// The support tool was confirmed running.
    Confirmed,
    /// The tool did not become visible within the settle timeout; it may
    /// still be starting.
    TimedOutUnconfirmed,
    /// The tool is not installed at the configured path.
    MissingExecutable,
    /// The fresh instance could not be started.
    Failed,
}

/// Orchestration core behind the support-tool window.
pub struct SupportAgent {
    config: AgentConfig,
    client: reqwest::Client,
    status: StatusSink,
    cancel: CancellationToken,
    update_started: AtomicBool,
}

impl SupportAgent {
    /// Build the agent and hand back the status receiver the presentation
    /// layer polls/observes.
    pub fn new(config: AgentConfig) -> (Self, watch::Receiver<StatusSnapshot>) {
        let (status, status_rx) = StatusSink::new();
        let client = reqwest::Client::builder()
            .connect_timeout(config.update.request_timeout())
            .build()
            .unwrap_or_default();

        let agent = Self {
            config,
            client,
            status,
            cancel: CancellationToken::new(),
            update_started: AtomicBool::new(false),
        };
        (agent, status_rx)
    }

    /// Startup update check. Returns what the host must do next; on
    /// [`UpdateOutcome::ExitRequired`] the host terminates the current
    /// process immediately.
    ///
    /// Only one update session may run per process lifetime; repeat calls
    /// are ignored and report `UpToDate`.
    pub async fn check_for_update(&self) -> UpdateOutcome {
        if self.update_started.swap(true, Ordering::SeqCst) {
            warn!("update check already ran this process; ignoring repeat trigger");
            return UpdateOutcome::UpToDate;
        }

        let launcher = UpdateLauncher::new(
            self.config.update.clone(),
            self.client.clone(),
            self.status.clone(),
            self.cancel.child_token(),
        );
        launcher.run_startup_check().await
    }

    /// Stop conflicting support-tool instances and start a fresh one.
    ///
    /// May run while an update check is in flight; the two touch disjoint
    /// resources. Not subject to the shutdown cancel scope: a half-finished
    /// stop/start would leave the tool in an ambiguous state.
    pub async fn relaunch_support_tool(&self) -> RelaunchReport {
        let tool = &self.config.support_tool;
        self.status.set_text("Restarting the support tool…");

        match supervisor::relaunch(&tool.executable_path, &tool.process_aliases, tool).await {
            Ok(RelaunchOutcome::Confirmed) => {
                info!("support tool relaunched");
                self.status.clear();
                RelaunchReport::Confirmed
            }
            Ok(RelaunchOutcome::TimedOutUnconfirmed) => {
                self.status
                    .set_text("Could not confirm the support tool started.");
                RelaunchReport::TimedOutUnconfirmed
            }
            Err(AgentError::MissingExecutable(path)) => {
                self.status
                    .set_text(format!("Support tool not installed at {path}."));
                RelaunchReport::MissingExecutable
            }
            Err(e) => {
                warn!("relaunch failed: {e}");
                self.status
                    .set_text(format!("Could not restart the support tool: {e}"));
                RelaunchReport::Failed
            }
        }
    }

    /// Fire-and-forget: open an auxiliary download page in the default
    /// browser. Failures are swallowed by the shell delegate.
    pub fn open_auxiliary_url(&self, url: &str) {
        platform::open_in_browser(url);
    }

    /// Cancel the root scope. Idempotent; the presentation layer calls this
    /// exactly once when the window closes.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Derived cancellation scope for auxiliary tasks the host may run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}
