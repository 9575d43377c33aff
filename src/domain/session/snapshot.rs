//! Published session state

use serde::Serialize;

use crate::domain::recording::{Recording, RecordingId};

use super::SessionState;

/// What observers see after every mutating operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub recordings: Vec<Recording>,
    pub is_recording: bool,
    pub currently_playing: Option<RecordingId>,
}

impl SessionSnapshot {
    pub fn state(&self) -> SessionState {
        match (self.is_recording, &self.currently_playing) {
            (true, _) => SessionState::Recording,
            (false, Some(id)) => SessionState::Playing(id.clone()),
            (false, None) => SessionState::Idle,
        }
    }

    pub fn is_playing(&self, recording: &Recording) -> bool {
        self.currently_playing.as_ref() == Some(&recording.id)
    }

    /// Look up a recording by its position in the list
    pub fn recording_at(&self, index: usize) -> Option<&Recording> {
        self.recordings.get(index)
    }

    pub fn find(&self, id: &RecordingId) -> Option<&Recording> {
        self.recordings.iter().find(|r| &r.id == id)
    }
}
