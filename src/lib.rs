//! Assista: remote-support companion agent core.
//!
//! Keeps the locally installed support tool up to date and supervises the
//! lifecycle of the external remote-support process:
//!
//! - **Version oracle**: resolves the latest published version over HTTPS
//! - **Download engine**: streams the updater artifact with progress
//! - **Updater launcher**: countdown → download → elevated handoff
//! - **Process supervisor**: stop, restart, and confirm the support tool
//! - **Status sink**: single-slot status channel for the presentation layer
//!
//! Presentation (window, menus, browser pane) lives outside this crate and
//! talks to [`SupportAgent`] only.

pub mod agent;
pub mod config;
pub mod download;
pub mod error;
pub mod platform;
pub mod status;
pub mod supervisor;
pub mod updater;
pub mod version;

pub use agent::{RelaunchReport, SupportAgent};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use status::{StatusSink, StatusSnapshot};
pub use supervisor::RelaunchOutcome;
pub use updater::{UpdateOutcome, UpdatePhase};
pub use version::Version;
