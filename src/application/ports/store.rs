//! Recording storage port

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::recording::{Recording, RecordingId};

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to read recordings directory {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to create recording {path}: {message}")]
    CreateFailed { path: String, message: String },

    #[error("Failed to remove recording {path}: {message}")]
    RemoveFailed { path: String, message: String },
}

/// Port for the directory recordings live in.
///
/// There is no index: `list` scans the directory every time.
pub trait RecordingStore: Send + Sync {
    /// Directory holding the recordings
    fn directory(&self) -> &Path;

    /// Scan the directory for files carrying the recording extension.
    fn list(&self) -> Result<Vec<Recording>, StoreError>;

    /// Create an empty file for a new recording and return its path.
    /// Fails if the file already exists.
    fn create(&self, id: &RecordingId) -> Result<PathBuf, StoreError>;

    /// Remove a recording file.
    fn remove(&self, path: &Path) -> Result<(), StoreError>;
}
