//! Process name resolution
//!
//! Maps a session's owning pid to a display name via `/proc/<pid>/comm`.

use std::fs;
use tracing::trace;

use crate::sessions::NameResolver;

/// `NameResolver` backed by the `/proc` filesystem.
pub struct ProcResolver;

impl NameResolver for ProcResolver {
    fn resolve(&self, pid: u32) -> Option<String> {
        // pid 0 denotes system-owned sound; there is no process to name.
        if pid == 0 {
            return None;
        }

        // The process may have exited between session enumeration and this
        // lookup. That race is expected: drop the session, don't error.
        match fs::read_to_string(format!("/proc/{pid}/comm")) {
            Ok(comm) => {
                let name = comm.trim_end();
                (!name.is_empty()).then(|| name.to_string())
            }
            Err(e) => {
                trace!(pid, "process name lookup failed: {e}");
                None
            }
        }
    }
}
