//! Application layer - Session manager and port interfaces
//!
//! Contains the recording session manager and the trait definitions
//! for the platform facilities it drives.

pub mod ports;
pub mod session;

// Re-export the manager
pub use session::{PlatformAudioError, RecordingSessionManager, SessionConfig, SessionPorts};
