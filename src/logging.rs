//! Logging initialization
//!
//! CLI commands log to stderr at `warn` unless `RUST_LOG` overrides. The
//! daemon respects the configured `log_level` and writes to a file under the
//! state directory unless it runs in the foreground.

use color_eyre::eyre::{self, Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Initialize logging for one-shot CLI commands.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize daemon logging.
///
/// Foreground: stderr. Background: non-blocking file writer under
/// `$XDG_STATE_HOME/sndwho/daemon.log`. The returned guard must be held for
/// the daemon's lifetime or buffered log lines are lost.
pub fn init_daemon(config: &Config, foreground: bool) -> Result<Option<WorkerGuard>> {
    // Filter format: "sndwho=LEVEL" keeps only our crate at the configured
    // level; RUST_LOG overrides everything.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sndwho={}", config.settings.log_level)));

    if foreground {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log_dir = state_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log dir: {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(&log_dir, "daemon.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

fn state_dir() -> Result<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("sndwho"))
        .ok_or_else(|| eyre::eyre!("Could not determine state directory"))
}
