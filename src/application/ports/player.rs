//! Playback port interface

use std::path::Path;
use std::sync::Weak;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::PlaybackToken;

use super::PlaybackDelegate;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Failed to open recording: {0}")]
    OpenFailed(String),

    #[error("Failed to decode recording: {0}")]
    DecodeFailed(String),

    #[error("Audio output not available: {0}")]
    DeviceNotAvailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Port for playing one recording at a time
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Open `path` and start playing it.
    ///
    /// On success any previous playback is stopped first. On error the
    /// previous playback, if any, keeps playing. Natural completion is
    /// reported to `delegate` with `token`.
    async fn play(
        &self,
        path: &Path,
        token: PlaybackToken,
        delegate: Weak<dyn PlaybackDelegate>,
    ) -> Result<(), PlaybackError>;

    /// Stop the active playback without notifying the delegate.
    fn stop(&self);

    /// Check if something is playing
    fn is_active(&self) -> bool;
}
