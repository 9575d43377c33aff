//! Completion callbacks delivered by the audio backends
//!
//! Backends hold a `Weak` reference to the delegate so a dropped session
//! manager is never kept alive by a playing sound.

use std::path::Path;

use crate::domain::session::PlaybackToken;

/// Receives playback completion from a [`super::PlaybackBackend`].
pub trait PlaybackDelegate: Send + Sync {
    /// Called once when the playback identified by `token` reaches the end of
    /// the file (`successfully == true`) or dies on a decode/device error.
    /// Never called for an explicit stop.
    fn playback_finished(&self, token: PlaybackToken, successfully: bool);
}

/// Receives capture interruptions from a [`super::CaptureBackend`].
pub trait CaptureDelegate: Send + Sync {
    /// Called from the audio thread when the capture writing to `path` can no
    /// longer continue.
    fn capture_interrupted(&self, path: &Path, reason: &str);
}
