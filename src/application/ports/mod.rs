//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the session manager
//! and the platform audio / filesystem adapters.

pub mod audio_session;
pub mod config;
pub mod delegate;
pub mod monitor;
pub mod permission;
pub mod player;
pub mod recorder;
pub mod store;

// Re-export common types
pub use audio_session::{AudioSession, SessionError};
pub use config::ConfigStore;
pub use delegate::{CaptureDelegate, PlaybackDelegate};
pub use monitor::{MonitorError, MonitorTap};
pub use permission::MicrophonePermission;
pub use player::{PlaybackBackend, PlaybackError};
pub use recorder::{CaptureBackend, CaptureSummary, RecordingError};
pub use store::{RecordingStore, StoreError};
