//! IPC infrastructure for daemon communication
//!
//! Unix socket transport for the text-command protocol. Requests are raw
//! UTF-8 text with no framing beyond "one read per connection"; responses
//! are raw UTF-8 text (a JSON array or a literal acknowledgement).

use color_eyre::eyre::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

// ============================================================================
// Protocol
// ============================================================================

/// Query the sessions currently playing. Response: a JSON array of
/// `{"name": ...}` objects, possibly `[]`.
pub const CMD_GET_SESSIONS: &str = "GET_SESSIONS";

/// Stop the daemon. Response: [`RESP_STOPPED`], after which the accept loop
/// exits.
pub const CMD_STOP: &str = "STOP";

/// Acknowledgement written in response to [`CMD_STOP`].
pub const RESP_STOPPED: &str = "STOPPED";

/// Written in response to any unrecognized command.
pub const RESP_UNRECOGNIZED: &str = "ERR unrecognized command";

/// A request is read once into a buffer of this size. Longer requests are
/// truncated, not reassembled; every defined command fits comfortably.
pub const REQUEST_BUF_SIZE: usize = 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

// ============================================================================
// Socket Path Management
// ============================================================================

/// Get the IPC socket path
/// Prefers `$XDG_RUNTIME_DIR/sndwho.sock`, falls back to `/tmp/sndwho.sock`
#[must_use]
pub fn socket_path() -> PathBuf {
    socket_path_from(std::env::var("XDG_RUNTIME_DIR").ok().as_deref())
}

/// An unset or empty runtime dir falls back to /tmp; an empty value must
/// not produce a relative path.
fn socket_path_from(runtime_dir: Option<&str>) -> PathBuf {
    match runtime_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join("sndwho.sock"),
        _ => PathBuf::from("/tmp/sndwho.sock"),
    }
}

/// Remove a stale socket file left behind by a dead daemon.
///
/// A socket that accepts a connection belongs to a live daemon and is left
/// alone; binding it again is then surfaced as a startup error.
pub async fn cleanup_stale_socket(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match tokio::time::timeout(PROBE_TIMEOUT, UnixStream::connect(path)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) | Err(_) => {
            debug!("removing stale socket: {}", path.display());
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove stale socket: {}", path.display()))?;
            Ok(())
        }
    }
}

/// Check whether a daemon is currently serving the socket.
pub async fn is_daemon_running() -> bool {
    let path = socket_path();
    if !path.exists() {
        return false;
    }
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, UnixStream::connect(&path)).await,
        Ok(Ok(_))
    )
}

// ============================================================================
// IPC Client (for CLI commands)
// ============================================================================

/// Send one text command to the daemon and collect the full response.
pub async fn send_command(command: &str) -> Result<String> {
    send_command_at(&socket_path(), command).await
}

/// Like [`send_command`] against an explicit socket path. Used by tests.
pub async fn send_command_at(path: &Path, command: &str) -> Result<String> {
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(path))
        .await
        .context("Timeout connecting to daemon")?
        .with_context(|| {
            format!(
                "Failed to connect to daemon. Is the daemon running?\nSocket: {}",
                path.display()
            )
        })?;

    debug!("connected to daemon at {}", path.display());

    stream
        .write_all(command.as_bytes())
        .await
        .context("Failed to write command")?;

    // The server writes the response and closes; read to EOF.
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .context("Failed to read response")?;

    Ok(response)
}

// ============================================================================
// IPC Server (for daemon)
// ============================================================================

/// Bound listener for the daemon's accept loop. Removes its socket file on
/// drop so a stopped daemon leaves nothing to clean up.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcServer {
    /// Bind the well-known socket, clearing any stale file first.
    ///
    /// # Errors
    /// Fails if the name is already bound by a live daemon - a startup
    /// condition surfaced to the process boundary, not handled here.
    pub async fn bind() -> Result<Self> {
        Self::bind_at(socket_path()).await
    }

    /// Bind at an explicit path. Used by tests.
    pub async fn bind_at(socket_path: PathBuf) -> Result<Self> {
        cleanup_stale_socket(&socket_path).await?;

        let listener = UnixListener::bind(&socket_path).with_context(|| {
            format!("Failed to bind IPC socket: {}", socket_path.display())
        })?;

        debug!("IPC server listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept the next incoming connection
    /// Returns None if accept fails (non-fatal)
    pub async fn accept(&self) -> Option<UnixStream> {
        match self.listener.accept().await {
            Ok((stream, _addr)) => Some(stream),
            Err(e) => {
                error!("Failed to accept IPC connection: {}", e);
                None
            }
        }
    }

    /// Get the socket path
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!("Failed to remove IPC socket on shutdown: {}", e);
        } else {
            debug!("removed IPC socket: {}", self.socket_path.display());
        }
    }
}
