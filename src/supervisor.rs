//! Lifecycle supervision of the external remote-support tool.
//!
//! Stop conflicting instances, start a fresh one, and confirm it actually
//! came up. Discovery always re-reads the OS process table; no handle
//! survives the stop → start boundary.

use crate::config::SupportToolConfig;
use crate::error::{AgentError, Result};
use std::path::Path;
use std::time::Duration;
use sysinfo::{Pid, Process, ProcessStatus, Signal, System};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Outcome of a relaunch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaunchOutcome {
    /// A matching process was observed within the settle timeout.
    Confirmed,
    /// No matching process appeared in time. The tool may still be starting;
    /// this is reported, not retried.
    TimedOutUnconfirmed,
}

/// Stop every running instance matching `aliases`, start `executable` fresh,
/// and poll the process table until the tool is visible or the settle
/// timeout elapses.
///
/// # Errors
///
/// `MissingExecutable` when `executable` is absent — checked before any
/// running process is touched, so the stop and spawn steps are never
/// reached. `Io` when the spawn itself fails.
pub async fn relaunch(
    executable: &Path,
    aliases: &[String],
    config: &SupportToolConfig,
) -> Result<RelaunchOutcome> {
    if !executable.exists() {
        return Err(AgentError::MissingExecutable(
            executable.display().to_string(),
        ));
    }

    stop_matching(aliases, config.graceful_timeout(), config.poll_interval()).await;

    // Detach: the child handle is dropped, never carried across cycles.
    // tokio reaps the orphaned child once it exits, so a finished tool
    // never lingers in the table as a zombie of this process.
    tokio::process::Command::new(executable).spawn()?;
    info!("spawned {}", executable.display());

    let confirmed = wait_until(
        || live_match_count(aliases) > 0,
        config.settle_timeout(),
        config.poll_interval(),
    )
    .await;

    if confirmed {
        info!("support tool confirmed running");
        Ok(RelaunchOutcome::Confirmed)
    } else {
        warn!("support tool not visible within the settle timeout");
        Ok(RelaunchOutcome::TimedOutUnconfirmed)
    }
}

/// Gracefully stop every process matching the alias set, force-terminating
/// stragglers. Failures touching one process are swallowed so the rest still
/// get processed, and every wait is bounded; an instance that survives both
/// signals is logged and skipped rather than waited on forever.
pub async fn stop_matching(aliases: &[String], graceful: Duration, poll: Duration) {
    let mut sys = System::new();
    sys.refresh_processes();

    let pids: Vec<Pid> = sys
        .processes()
        .iter()
        .filter(|(_, p)| is_live_match(p, aliases))
        .map(|(pid, _)| *pid)
        .collect();

    for pid in pids {
        let Some(process) = sys.process(pid) else {
            continue; // exited on its own
        };
        let name = process.name().to_owned();

        // Graceful request first; not every platform can deliver Term.
        let signalled = process
            .kill_with(Signal::Term)
            .unwrap_or_else(|| process.kill());
        if !signalled {
            warn!("could not signal {name} (pid {pid}); skipping");
            continue;
        }

        let exited = wait_until(|| !pid_live(pid), graceful, poll).await;
        if !exited {
            debug!("{name} (pid {pid}) ignored graceful stop; force-terminating");
            let mut fresh = System::new();
            fresh.refresh_processes();
            if let Some(p) = fresh.process(pid) {
                p.kill();
            }
            // Bounded like the graceful wait; a process this agent cannot
            // terminate must not stall the rest of the sweep.
            let gone = wait_until(|| !pid_live(pid), graceful, poll).await;
            if !gone {
                warn!("{name} (pid {pid}) survived force-terminate; skipping");
                continue;
            }
        }
        info!("stopped {name} (pid {pid})");
    }
}

/// Bounded poll loop over a liveness probe. The probe runs before the first
/// sleep, so an already-true condition returns immediately.
pub async fn wait_until<F>(mut probe: F, timeout: Duration, poll: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(poll).await;
    }
}

/// Fresh process-table enumeration counting live alias matches.
fn live_match_count(aliases: &[String]) -> usize {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes()
        .values()
        .filter(|p| is_live_match(p, aliases))
        .count()
}

/// An alias match that is actually running. Zombies are table entries for
/// processes that already exited; they cannot be signalled and must neither
/// be stopped nor counted as the tool being up.
fn is_live_match(process: &Process, aliases: &[String]) -> bool {
    alias_matches(process.name(), aliases) && !matches!(process.status(), ProcessStatus::Zombie)
}

fn pid_live(pid: Pid) -> bool {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.process(pid)
        .is_some_and(|p| !matches!(p.status(), ProcessStatus::Zombie))
}

/// Case-insensitive alias match; a trailing `.exe` on the table entry is
/// ignored.
fn alias_matches(process_name: &str, aliases: &[String]) -> bool {
    let lowered = process_name.to_ascii_lowercase();
    let bare = lowered.strip_suffix(".exe").unwrap_or(&lowered);
    aliases.iter().any(|alias| alias.eq_ignore_ascii_case(bare))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::cell::Cell;

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn alias_match_is_case_insensitive() {
        let set = aliases(&["tool", "tool_svc"]);
        assert!(alias_matches("Tool", &set));
        assert!(alias_matches("TOOL_SVC", &set));
        assert!(!alias_matches("toolbox", &set));
    }

    #[test]
    fn alias_match_ignores_exe_suffix() {
        let set = aliases(&["tool"]);
        assert!(alias_matches("tool.exe", &set));
        assert!(alias_matches("Tool.EXE", &set));
        assert!(!alias_matches("tool.exe.bak", &set));
    }

    #[tokio::test]
    async fn wait_until_confirms_once_probe_flips() {
        let calls = Cell::new(0u32);
        let confirmed = wait_until(
            || {
                calls.set(calls.get() + 1);
                calls.get() >= 3
            },
            Duration::from_secs(1),
            Duration::from_millis(5),
        )
        .await;
        assert!(confirmed);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn wait_until_times_out_when_probe_stays_false() {
        let start = std::time::Instant::now();
        let confirmed =
            wait_until(|| false, Duration::from_millis(50), Duration::from_millis(5)).await;
        assert!(!confirmed);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn wait_until_short_circuits_on_true_probe() {
        assert!(wait_until(|| true, Duration::ZERO, Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn relaunch_with_missing_executable_never_spawns() {
        let config = SupportToolConfig::default();
        let result = relaunch(
            Path::new("/nonexistent/assista-test-tool"),
            &aliases(&["assista-test-tool"]),
            &config,
        )
        .await;
        assert!(matches!(result, Err(AgentError::MissingExecutable(_))));
    }

    #[tokio::test]
    async fn stop_matching_is_a_noop_without_matches() {
        // Nothing on the system is called this; must return without touching
        // anything.
        stop_matching(
            &aliases(&["assista-nonexistent-alias"]),
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;
    }
}
