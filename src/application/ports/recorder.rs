//! Capture port interface

use std::path::{Path, PathBuf};
use std::sync::Weak;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::RecordingFormat;

use super::CaptureDelegate;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording already in progress")]
    AlreadyCapturing,

    #[error("No recording in progress")]
    NotCapturing,

    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("No audio data captured")]
    NoAudioCaptured,

    #[error("Failed to encode audio: {0}")]
    EncodeFailed(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),
}

/// Result of a finalized capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub path: PathBuf,
    /// Samples written after resampling to the recording format
    pub samples: u64,
    pub bytes_written: u64,
}

impl CaptureSummary {
    /// Duration of the written audio in milliseconds
    pub fn duration_ms(&self, format: RecordingFormat) -> u64 {
        if format.sample_rate == 0 {
            return 0;
        }
        self.samples * 1000 / format.sample_rate as u64
    }
}

/// Port for microphone capture into a file (open-ended, stopped explicitly)
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing into `path` (the file already exists and is empty).
    ///
    /// Input stream failures after a successful start are reported through
    /// `delegate`.
    async fn start(
        &self,
        path: &Path,
        format: RecordingFormat,
        delegate: Weak<dyn CaptureDelegate>,
    ) -> Result<(), RecordingError>;

    /// Stop capturing and write the encoded audio to the file.
    async fn stop(&self) -> Result<CaptureSummary, RecordingError>;

    /// Stop capturing and discard everything captured so far.
    fn abort(&self);

    /// Check if currently capturing
    fn is_capturing(&self) -> bool;

    /// Get elapsed capture time in milliseconds
    fn elapsed_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_duration_uses_format_rate() {
        let summary = CaptureSummary {
            path: PathBuf::from("a.flac"),
            samples: 24_000,
            bytes_written: 100,
        };
        assert_eq!(summary.duration_ms(RecordingFormat::voice_memo()), 2000);
    }
}
