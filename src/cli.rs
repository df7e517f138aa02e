//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Parser, Subcommand};

/// sndwho - who is making sound right now
#[derive(Parser)]
#[command(name = "sndwho")]
#[command(version)]
#[command(about = "Report which processes are playing sound on the default output device")]
#[command(after_help = "\
BEHAVIOR:
  - One-shot mode queries the default playback device once, prints a JSON
    array of {\"name\": ...} objects, and exits with status 0
  - No default playback device is not an error: the output is []
  - A process owning several playing sessions appears once per session

DAEMON MANAGEMENT:
  sndwho daemon              Run the IPC daemon (logs to a file)
  sndwho daemon --foreground Run with logs to stderr
  sndwho status              Check whether the daemon is running
  sndwho stop                Ask the daemon to stop

IPC PROTOCOL:
  Socket: $XDG_RUNTIME_DIR/sndwho.sock (or /tmp/sndwho.sock)
  Commands are raw text, one per connection:
    GET_SESSIONS  -> JSON array of {\"name\": ...} objects
    STOP          -> the literal STOPPED

CLASSIFICATION:
  \"Playing\" is decided by the configured policy: state (mixer-reported
  activity, the default) or level (unmuted and above peak_threshold).")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Print the sessions currently playing and exit (the default)
    Sessions {
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Run the IPC daemon
    Daemon {
        /// Log to stderr instead of the state-directory log file
        #[arg(short, long)]
        foreground: bool,
    },

    /// Check whether the daemon is running
    Status,

    /// Ask the running daemon to stop
    Stop,

    /// Validate the config file (local, no daemon needed)
    Validate,
}
