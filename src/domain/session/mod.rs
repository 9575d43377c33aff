//! Recording session state

mod options;
mod session_state;
mod snapshot;

pub use options::{SessionCategory, SessionOptions};
pub use session_state::{
    ActiveCapture, ActivePlayback, InvalidStateTransition, PlaybackToken, RecordingSession,
    SessionState,
};
pub use snapshot::SessionSnapshot;
