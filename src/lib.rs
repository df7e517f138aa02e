//! `sndwho` - who is making sound right now
//!
//! Reports which processes are currently producing audible output through
//! the default playback device, either as a one-shot query or as a local
//! daemon answering a minimal text-command protocol over a Unix socket.
//!
//! # Architecture
//! - [`sessions`]: the query engine - classification policy, name
//!   resolution, orchestration. OS access sits behind narrow traits.
//! - [`pipewire`]: the production session source (`pw-dump`).
//! - [`process`]: pid-to-name resolution via `/proc`.
//! - [`ipc`] / [`daemon`]: the single-connection-at-a-time request loop and
//!   its wire protocol (`GET_SESSIONS`, `STOP`).

pub mod cli;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod ipc;
pub mod logging;
pub mod pipewire;
pub mod process;
pub mod sessions;

// Re-export commonly used types for convenience
pub use cli::Args;
pub use config::Config;
pub use sessions::{PlayingPolicy, PlayingSession, SessionQuery};
