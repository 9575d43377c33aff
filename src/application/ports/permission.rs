//! Microphone permission port

use async_trait::async_trait;

/// Port for asking the platform for microphone access
#[async_trait]
pub trait MicrophonePermission: Send + Sync {
    /// Returns whether access was granted.
    async fn request(&self) -> bool;
}
