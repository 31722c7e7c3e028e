//! Supervisor behavior against real child processes.
//!
//! Each test materializes a throwaway tool under a name unique to this test
//! process, so parallel runs never sweep each other's children.

#![cfg(unix)]

use assista::config::SupportToolConfig;
use assista::supervisor::{RelaunchOutcome, relaunch, stop_matching};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Pid, ProcessStatus, System};

fn write_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn live_count(name: &str) -> usize {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes()
        .values()
        .filter(|p| p.name() == name && !matches!(p.status(), ProcessStatus::Zombie))
        .count()
}

fn table_status(pid: u32) -> Option<ProcessStatus> {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.process(Pid::from_u32(pid)).map(|p| p.status())
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(std::time::Instant::now() < deadline, "timed out: {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// A matching table entry whose process already exited cannot be stopped;
// the sweep must skip past it instead of polling forever.
#[tokio::test]
async fn sweep_finishes_promptly_past_an_exited_table_entry() {
    let dir = tempfile::tempdir().unwrap();
    let name = format!("as-z-{}", std::process::id());
    let tool = write_tool(dir.path(), &name, "#!/bin/sh\nexit 0\n");

    // Spawned and deliberately left unreaped until the end of the test, so
    // the exited child keeps its entry in the process table.
    let mut child = std::process::Command::new(&tool).spawn().unwrap();
    let pid = child.id();
    wait_for("child exit", || {
        table_status(pid) == Some(ProcessStatus::Zombie)
    })
    .await;

    let swept = tokio::time::timeout(
        Duration::from_secs(3),
        stop_matching(
            &[name.clone()],
            Duration::from_millis(500),
            Duration::from_millis(20),
        ),
    )
    .await;
    assert!(swept.is_ok(), "sweep stalled on an entry that cannot exit");

    let _ = child.wait();
}

// Full relaunch against an instance that ignores the graceful stop: it gets
// force-terminated, the replacement comes up, and the settle poll confirms it.
#[tokio::test]
async fn stubborn_instance_is_force_terminated_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let name = format!("as-s-{}", std::process::id());
    let tool = write_tool(
        dir.path(),
        &name,
        "#!/bin/sh\ntrap '' TERM\nwhile :; do sleep 1; done\n",
    );

    let mut old = std::process::Command::new(&tool).spawn().unwrap();
    let old_pid = old.id();
    wait_for("first instance visible", || live_count(&name) > 0).await;

    let config = SupportToolConfig {
        graceful_timeout_secs: 1,
        settle_timeout_secs: 10,
        poll_interval_ms: 50,
        ..Default::default()
    };
    let aliases = vec![name.clone()];
    let outcome = tokio::time::timeout(Duration::from_secs(15), relaunch(&tool, &aliases, &config))
        .await
        .expect("relaunch stalled")
        .unwrap();
    assert_eq!(outcome, RelaunchOutcome::Confirmed);

    assert!(
        !matches!(table_status(old_pid), Some(ProcessStatus::Run)),
        "first instance survived the relaunch"
    );
    assert!(live_count(&name) >= 1, "replacement instance not visible");

    let _ = old.wait();
    stop_matching(
        &aliases,
        Duration::from_millis(200),
        Duration::from_millis(20),
    )
    .await;
}
