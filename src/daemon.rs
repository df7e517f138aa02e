//! Daemon mode
//!
//! Runs the IPC accept loop: one connection at a time, read a text command,
//! dispatch to the session query engine or the stop action, write the
//! response, accept the next connection. No per-connection tasks are
//! spawned, which also guarantees at most one audio query in flight.

use color_eyre::eyre::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ipc::{
    IpcServer, CMD_GET_SESSIONS, CMD_STOP, REQUEST_BUF_SIZE, RESP_STOPPED, RESP_UNRECOGNIZED,
};
use crate::pipewire::PipeWireSource;
use crate::process::ProcResolver;
use crate::sessions::{NameResolver, SessionQuery, SessionSource};

/// What the accept loop should do after a connection is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientAction {
    Continue,
    Stop,
}

/// Run the daemon with the given configuration.
///
/// # Errors
/// Fails if the IPC socket cannot be bound (e.g. another daemon holds it) -
/// a startup condition surfaced to the process boundary.
pub async fn run(config: Config, foreground: bool) -> Result<()> {
    let _guard = crate::logging::init_daemon(&config, foreground)?;

    info!("starting sndwho daemon");

    let server = IpcServer::bind().await?;
    info!("IPC server listening on {}", server.socket_path().display());

    let engine = SessionQuery::new(PipeWireSource, ProcResolver, config.settings.policy);
    serve(server, engine, config.settings.read_timeout).await
}

/// The accept loop. Exits after a `STOP` command is acknowledged or on
/// Ctrl-C while idle-waiting.
///
/// The running flag is a plain local boolean: written by the `STOP` arm,
/// read at the top of the loop, single task throughout.
pub async fn serve<S, R>(
    server: IpcServer,
    engine: SessionQuery<S, R>,
    read_timeout: Duration,
) -> Result<()>
where
    S: SessionSource,
    R: NameResolver,
{
    let mut running = true;

    while running {
        tokio::select! {
            maybe_stream = server.accept() => {
                let Some(mut stream) = maybe_stream else { continue };
                match handle_client(&mut stream, &engine, read_timeout).await {
                    Ok(ClientAction::Stop) => {
                        info!("stop requested; exiting accept loop");
                        running = false;
                    }
                    Ok(ClientAction::Continue) => {}
                    Err(e) => error!("client handling error: {e:#}"),
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutting down");
                running = false;
            }
        }
    }

    // IpcServer's Drop removes the socket; later connection attempts fail.
    Ok(())
}

/// Handle one connection: a single bounded read, one dispatch, one response.
async fn handle_client<S, R>(
    stream: &mut UnixStream,
    engine: &SessionQuery<S, R>,
    read_timeout: Duration,
) -> Result<ClientAction>
where
    S: SessionSource,
    R: NameResolver,
{
    // One read per connection; longer requests are truncated, not
    // reassembled. Every defined command fits in the buffer.
    let mut buf = [0u8; REQUEST_BUF_SIZE];
    let n = tokio::time::timeout(read_timeout, stream.read(&mut buf))
        .await
        .context("Timeout waiting for client command")?
        .context("Failed to read client command")?;

    // A peer that connects and closes without writing is a liveness check
    // (the stale-socket and status checks do exactly this), not a protocol
    // error. Writing anything back would hit a closed socket.
    if n == 0 {
        return Ok(ClientAction::Continue);
    }

    let request = String::from_utf8_lossy(&buf[..n]);
    let command = request.trim_end();

    match command {
        CMD_GET_SESSIONS => {
            let sessions = engine.playing_sessions().into_sessions();
            let json = serde_json::to_string(&sessions)
                .context("Failed to serialize session list")?;
            write_response(stream, &json).await?;
            Ok(ClientAction::Continue)
        }
        CMD_STOP => {
            write_response(stream, RESP_STOPPED).await?;
            Ok(ClientAction::Stop)
        }
        other => {
            warn!("unrecognized command: {other:?}");
            write_response(stream, RESP_UNRECOGNIZED).await?;
            Ok(ClientAction::Continue)
        }
    }
}

async fn write_response(stream: &mut UnixStream, response: &str) -> Result<()> {
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write response")?;
    stream.flush().await.context("Failed to flush response")?;
    Ok(())
}
