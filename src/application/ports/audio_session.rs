//! Audio session port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::SessionOptions;

/// Audio session errors
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Bluetooth routing is disabled, refusing device: {0}")]
    BluetoothNotAllowed(String),

    #[error("Audio session unavailable: {0}")]
    Unavailable(String),
}

/// Port for the platform audio session shared by capture, playback and monitoring
#[async_trait]
pub trait AudioSession: Send + Sync {
    /// Configure and activate the session for the given category and routing.
    async fn configure(&self, options: &SessionOptions) -> Result<(), SessionError>;
}
