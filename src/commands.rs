//! CLI commands
//!
//! Implements the one-shot query plus the IPC-based commands that talk to a
//! running daemon.

use color_eyre::eyre::{self, Context, Result};

use crate::config::Config;
use crate::ipc::{self, CMD_STOP, RESP_STOPPED};
use crate::pipewire::PipeWireSource;
use crate::process::ProcResolver;
use crate::sessions::SessionQuery;

/// One-shot query: print the playing sessions as a JSON array and exit.
///
/// An empty result - whether from no device or from nothing qualifying -
/// prints `[]` and still succeeds.
///
/// # Errors
/// Returns an error only if JSON serialization fails.
pub fn sessions(config: &Config, compact: bool) -> Result<()> {
    let engine = SessionQuery::new(PipeWireSource, ProcResolver, config.settings.policy);
    let sessions = engine.playing_sessions().into_sessions();

    let json = if compact {
        serde_json::to_string(&sessions)
    } else {
        serde_json::to_string_pretty(&sessions)
    }
    .context("Failed to serialize session list")?;

    println!("{json}");
    Ok(())
}

/// Ask the running daemon to stop.
///
/// # Errors
/// Returns an error if no daemon is running or the daemon answers with
/// anything other than the stop acknowledgement.
pub async fn stop() -> Result<()> {
    if !ipc::is_daemon_running().await {
        eyre::bail!("Daemon is not running");
    }

    let response = ipc::send_command(CMD_STOP).await?;
    if response != RESP_STOPPED {
        eyre::bail!("Unexpected response from daemon: {response:?}");
    }

    println!("{response}");
    Ok(())
}

/// Report whether a daemon is serving the well-known socket.
pub async fn status() -> Result<()> {
    if ipc::is_daemon_running().await {
        println!("Daemon: running ({})", ipc::socket_path().display());
    } else {
        println!("Daemon: not running");
        println!("  Start with: sndwho daemon");
    }
    Ok(())
}
