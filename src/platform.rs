//! OS shell delegates: elevated updater spawn and browser handoff.

use crate::error::Result;
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Spawn `path` as a detached process, requesting elevation where the
/// platform has the concept.
///
/// On Windows the spawn goes through `Start-Process -Verb RunAs` so the UAC
/// prompt appears; elsewhere the binary is started directly and is expected
/// to escalate itself if it needs to. The child handle is dropped, detaching
/// the process.
///
/// # Errors
///
/// Returns an I/O error when the spawn itself fails.
pub fn spawn_elevated(path: &Path) -> Result<()> {
    if cfg!(target_os = "windows") {
        Command::new("powershell")
            .args(["-NoProfile", "-Command", "Start-Process", "-Verb", "RunAs", "-FilePath"])
            .arg(path)
            .spawn()?;
    } else {
        Command::new(path).spawn()?;
    }
    Ok(())
}

/// Open a URL with the platform's default handler.
///
/// Fire-and-forget: the shell owns the rest, and failures are logged and
/// swallowed.
pub fn open_in_browser(url: &str) {
    let result = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", "", url]).spawn()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    if let Err(e) = result {
        warn!("could not open {url} in a browser: {e}");
    }
}
