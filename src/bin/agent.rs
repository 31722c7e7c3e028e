//! Headless host binary for the support agent core.
//!
//! Stands in for the desktop shell: runs the startup update check, then the
//! requested action. Status snapshots go to stdout as JSON lines so a
//! wrapping UI can observe them; diagnostics go to stderr.

use assista::{AgentConfig, SupportAgent, UpdateOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing to stderr only; stdout carries the status stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("assista-agent starting");

    let config = AgentConfig::load();
    let (agent, mut status_rx) = SupportAgent::new(config);

    // Mirror every status snapshot for whatever shell wraps this binary.
    let printer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let snapshot = status_rx.borrow_and_update().clone();
            if let Ok(line) = serde_json::to_string(&snapshot) {
                println!("{line}");
            }
        }
    });

    if let UpdateOutcome::ExitRequired { updater } = agent.check_for_update().await {
        tracing::info!("handing off to updater at {}", updater.display());
        // Once the updater is running this process must not outlive it.
        std::process::exit(0);
    }

    if std::env::args().any(|arg| arg == "--relaunch") {
        let report = agent.relaunch_support_tool().await;
        tracing::info!(?report, "relaunch finished");
    }

    agent.shutdown();
    printer.abort();
    tracing::info!("assista-agent shut down cleanly");
    Ok(())
}
