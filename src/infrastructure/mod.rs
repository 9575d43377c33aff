//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, rodio and the filesystem.

pub mod audio_session;
pub mod config;
pub mod monitor;
pub mod playback;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use audio_session::{AudioRoute, CpalAudioSession, CpalPermission, SharedRoute};
pub use config::XdgConfigStore;
pub use monitor::{CpalMonitor, NoOpMonitor};
pub use playback::RodioPlayer;
pub use recording::CpalRecorder;
pub use storage::{default_recordings_dir, FsRecordingStore};
