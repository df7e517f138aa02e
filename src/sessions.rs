//! Session query engine
//!
//! Decides, for each audio session registered against the default playback
//! device, whether it counts as "playing" and which process owns it. The OS
//! side is abstracted behind [`SessionSource`] and [`NameResolver`] so the
//! engine is testable with synthetic fixtures.

use serde::Serialize;
use tracing::{debug, trace};

/// Lifecycle state of a raw audio session as reported by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The session is actively streaming to the device.
    Active,
    /// The session exists but is not currently streaming.
    Inactive,
    /// The owning client has gone away; the session is awaiting cleanup.
    Expired,
}

/// One audio session as seen by the OS mixer, re-read on every query and
/// discarded immediately after. Never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSession {
    /// Owning process id. 0 means system-owned sound with no user process.
    pub pid: u32,
    pub muted: bool,
    /// Instantaneous output level, 0.0 (silent) to 1.0 (maximum).
    pub peak: f32,
    pub state: SessionState,
}

/// Snapshot returned by a [`SessionSource`].
///
/// `NoDevice` is a normal outcome (no default playback device present, or
/// the platform query failed), not an error. Keeping it as a named variant
/// lets callers and tests distinguish "no device" from "device present, zero
/// sessions".
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSnapshot {
    NoDevice,
    Sessions(Vec<RawSession>),
}

/// Yields the raw set of audio sessions on the current default playback
/// device. One finite snapshot per call; not restartable, not live-updating.
pub trait SessionSource {
    fn open_default_sessions(&self) -> SessionSnapshot;
}

/// Resolves a process id to its display name.
///
/// Returns `None` for pid 0 (system sounds) and for processes that exited
/// between session enumeration and lookup - enumeration and resolution are
/// not atomic, so that race is expected and swallowed.
pub trait NameResolver {
    fn resolve(&self, pid: u32) -> Option<String>;
}

/// The replaceable "is this session playing?" predicate.
///
/// Selected by configuration; see `Settings::policy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayingPolicy {
    /// Playing iff the session state is `Active`. Canonical policy: tracks
    /// what the mixer reports rather than sampling output.
    State,
    /// Playing iff the session is unmuted and its instantaneous level
    /// exceeds `threshold`. Reacts to actual audible output at the cost of
    /// being a noisy instantaneous sample.
    Level { threshold: f32 },
}

impl PlayingPolicy {
    /// Default threshold for the level policy.
    pub const DEFAULT_THRESHOLD: f32 = 0.001;

    #[must_use]
    pub fn is_playing(self, session: &RawSession) -> bool {
        match self {
            Self::State => session.state == SessionState::Active,
            Self::Level { threshold } => !session.muted && session.peak > threshold,
        }
    }
}

impl Default for PlayingPolicy {
    fn default() -> Self {
        Self::State
    }
}

/// A session judged as playing. Only the resolved process name survives
/// classification; no pid or session handle is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayingSession {
    pub name: String,
}

/// Result of one full query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No default playback device was available.
    NoDevice,
    /// Device present; zero or more qualifying sessions.
    Sessions(Vec<PlayingSession>),
}

impl QueryOutcome {
    /// Flatten to a plain list for callers that do not care why it is empty.
    #[must_use]
    pub fn into_sessions(self) -> Vec<PlayingSession> {
        match self {
            Self::NoDevice => Vec::new(),
            Self::Sessions(sessions) => sessions,
        }
    }
}

/// Orchestrates source -> classify -> resolve -> collect.
///
/// Every query is self-contained: nothing observed here outlives the call.
pub struct SessionQuery<S, R> {
    source: S,
    resolver: R,
    policy: PlayingPolicy,
}

impl<S: SessionSource, R: NameResolver> SessionQuery<S, R> {
    pub fn new(source: S, resolver: R, policy: PlayingPolicy) -> Self {
        Self {
            source,
            resolver,
            policy,
        }
    }

    /// Query the sessions currently playing on the default device.
    ///
    /// Never fails and always terminates. Sessions that do not classify as
    /// playing, belong to pid 0, or whose process exited before name lookup
    /// are dropped. Duplicate names are preserved: a process owning two
    /// qualifying sessions appears twice.
    pub fn playing_sessions(&self) -> QueryOutcome {
        let raw = match self.source.open_default_sessions() {
            SessionSnapshot::NoDevice => {
                debug!("no default playback device; reporting empty result");
                return QueryOutcome::NoDevice;
            }
            SessionSnapshot::Sessions(raw) => raw,
        };

        trace!("enumerated {} raw sessions", raw.len());

        let mut playing = Vec::new();
        for session in &raw {
            if !self.policy.is_playing(session) {
                continue;
            }
            // Resolver returns None for pid 0 and for exited processes.
            let Some(name) = self.resolver.resolve(session.pid) else {
                trace!(pid = session.pid, "skipping unresolvable session");
                continue;
            };
            playing.push(PlayingSession { name });
        }

        QueryOutcome::Sessions(playing)
    }
}
