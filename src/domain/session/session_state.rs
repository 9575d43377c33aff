//! Session state machine
//!
//! Capture and playback are tracked independently: a capture can be active
//! while a recording plays, but there is never more than one of each.
//!
//! Capture:
//!   IDLE -> RECORDING (begin_capture)
//!   RECORDING -> IDLE (end_capture / end_capture_at)
//!
//! Playback target:
//!   none -> Some(id) (begin_playback)
//!   Some(a) -> Some(b) (begin_playback, replaces a)
//!   Some(_) -> none (end_playback / finish_playback with the current token)

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::recording::RecordingId;

/// Coarse session state as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Playing(RecordingId),
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing(_) => "playing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing(id) => write!(f, "playing {}", id),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Identifies one playback so late completions of a replaced player are ignored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlaybackToken(u64);

impl PlaybackToken {
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// The capture currently writing to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCapture {
    pub id: RecordingId,
    pub path: PathBuf,
}

/// The current playback target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePlayback {
    pub id: RecordingId,
    pub token: PlaybackToken,
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Recording session entity
#[derive(Debug, Default)]
pub struct RecordingSession {
    capture: Option<ActiveCapture>,
    playback: Option<ActivePlayback>,
    next_token: u64,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recording wins over playing when both are active
    pub fn state(&self) -> SessionState {
        match (&self.capture, &self.playback) {
            (Some(_), _) => SessionState::Recording,
            (None, Some(p)) => SessionState::Playing(p.id.clone()),
            (None, None) => SessionState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_playing(&self, id: &RecordingId) -> bool {
        self.playback.as_ref().is_some_and(|p| &p.id == id)
    }

    pub fn currently_playing(&self) -> Option<&RecordingId> {
        self.playback.as_ref().map(|p| &p.id)
    }

    pub fn active_capture(&self) -> Option<&ActiveCapture> {
        self.capture.as_ref()
    }

    /// Transition from IDLE to RECORDING
    pub fn begin_capture(
        &mut self,
        id: RecordingId,
        path: PathBuf,
    ) -> Result<(), InvalidStateTransition> {
        if self.capture.is_some() {
            return Err(InvalidStateTransition {
                current_state: self.state(),
                action: "start recording".to_string(),
            });
        }
        self.capture = Some(ActiveCapture { id, path });
        Ok(())
    }

    /// Transition from RECORDING to IDLE
    pub fn end_capture(&mut self) -> Result<ActiveCapture, InvalidStateTransition> {
        self.capture.take().ok_or_else(|| InvalidStateTransition {
            current_state: self.state(),
            action: "stop recording".to_string(),
        })
    }

    /// End the capture only if it writes to `path`
    pub fn end_capture_at(&mut self, path: &Path) -> Option<ActiveCapture> {
        if self.capture.as_ref().is_some_and(|c| c.path == path) {
            self.capture.take()
        } else {
            None
        }
    }

    /// Reserve the token for the next playback
    pub fn next_playback_token(&mut self) -> PlaybackToken {
        self.next_token += 1;
        PlaybackToken(self.next_token)
    }

    /// Make `id` the playback target, returning the target it replaced
    pub fn begin_playback(
        &mut self,
        id: RecordingId,
        token: PlaybackToken,
    ) -> Option<ActivePlayback> {
        self.playback.replace(ActivePlayback { id, token })
    }

    /// Clear the playback target
    pub fn end_playback(&mut self) -> Option<ActivePlayback> {
        self.playback.take()
    }

    /// Clear the playback target if `token` still identifies it
    pub fn finish_playback(&mut self, token: PlaybackToken) -> Option<ActivePlayback> {
        if self.playback.as_ref().is_some_and(|p| p.token == token) {
            self.playback.take()
        } else {
            None
        }
    }
}
