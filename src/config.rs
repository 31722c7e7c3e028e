//! Configuration types for the support agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Self-update settings.
    pub update: UpdateConfig,
    /// Supervised support-tool settings.
    pub support_tool: SupportToolConfig,
}

/// Self-update settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Plaintext endpoint publishing the latest version string.
    pub version_url: String,
    /// Endpoint serving the updater artifact.
    pub updater_url: String,
    /// Deterministic artifact filename inside the OS temp directory,
    /// overwritten on each attempt.
    pub updater_filename: String,
    /// Per-request network timeout in seconds.
    pub request_timeout_secs: u64,
    /// Discrete countdown ticks (~1 s apart) shown before downloading.
    pub countdown_ticks: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            version_url: "https://www.assista.app/support/version.txt".to_owned(),
            updater_url: "https://www.assista.app/support/assista-updater.exe".to_owned(),
            updater_filename: if cfg!(target_os = "windows") {
                "assista-updater.exe".to_owned()
            } else {
                "assista-updater".to_owned()
            },
            request_timeout_secs: 20,
            countdown_ticks: 4,
        }
    }
}

impl UpdateConfig {
    /// Network request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Supervised support-tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportToolConfig {
    /// Installed location of the support-tool executable.
    pub executable_path: PathBuf,
    /// Case-insensitive process names that count as the supervised tool.
    pub process_aliases: Vec<String>,
    /// Per-process wait for a graceful stop before force-terminating, seconds.
    pub graceful_timeout_secs: u64,
    /// Wait for a freshly spawned tool to appear in the process table, seconds.
    pub settle_timeout_secs: u64,
    /// Process-table poll interval, milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for SupportToolConfig {
    fn default() -> Self {
        Self {
            executable_path: default_install_path(),
            process_aliases: vec![
                "rsupport".to_owned(),
                "rsupport-host".to_owned(),
                "rsupport_svc".to_owned(),
            ],
            graceful_timeout_secs: 5,
            settle_timeout_secs: 20,
            poll_interval_ms: 150,
        }
    }
}

impl SupportToolConfig {
    /// Graceful per-process stop timeout as a [`Duration`].
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }

    /// Settle timeout as a [`Duration`].
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_install_path() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files (x86)\Assista\rsupport.exe")
    } else {
        PathBuf::from("/opt/assista/rsupport")
    }
}

impl AgentConfig {
    /// Returns the path of the agent config file, when a platform config
    /// directory exists.
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("assista").join("agent.toml"))
    }

    /// Load the configuration from disk. Returns the defaults if the file is
    /// missing or cannot be parsed; the agent carries no other persisted
    /// state.
    pub fn load() -> Self {
        let path = match Self::config_file_path() {
            Some(p) => p,
            None => return Self::default(),
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(_) => return Self::default(),
        };

        toml::from_str(&text).unwrap_or_default()
    }
}
