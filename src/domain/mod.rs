//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on audio devices or the filesystem.

pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use config::{AppConfig, AudioConfig};
pub use error::*;
pub use recording::{Recording, RecordingFormat, RecordingId, TimeLimit, RECORDING_EXTENSION};
pub use session::{
    InvalidStateTransition, PlaybackToken, RecordingSession, SessionOptions, SessionSnapshot,
    SessionState,
};
