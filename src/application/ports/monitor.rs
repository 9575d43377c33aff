//! Live monitoring port

use async_trait::async_trait;
use thiserror::Error;

/// Monitoring errors
#[derive(Debug, Clone, Error)]
pub enum MonitorError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Failed to start monitoring: {0}")]
    StartFailed(String),
}

/// Port for routing live microphone input to the output while capturing
#[async_trait]
pub trait MonitorTap: Send + Sync {
    /// Start routing input to output scaled by `gain`.
    async fn start(&self, gain: f32) -> Result<(), MonitorError>;

    /// Tear the route down. No-op when inactive.
    fn stop(&self);

    fn is_active(&self) -> bool;
}
