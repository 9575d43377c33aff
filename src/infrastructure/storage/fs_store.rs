//! Directory-backed recording store

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::application::ports::{RecordingStore, StoreError};
use crate::domain::recording::{Recording, RecordingId};

/// App folder under the user's documents directory
const APP_DIR_NAME: &str = "voice-memos";

/// Default recordings directory: `<documents>/voice-memos`
pub fn default_recordings_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Stores each recording as `<id>.flac` in one directory
pub struct FsRecordingStore {
    dir: PathBuf,
}

impl FsRecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_entry(path: PathBuf) -> Option<Recording> {
        let id = RecordingId::from_path(&path)?;
        let metadata = fs::metadata(&path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let created = metadata.created().or_else(|_| metadata.modified()).ok()?;
        Some(Recording::new(
            id,
            path,
            DateTime::<Utc>::from(created),
            metadata.len(),
        ))
    }
}

impl Default for FsRecordingStore {
    fn default() -> Self {
        Self::new(default_recordings_dir())
    }
}

impl RecordingStore for FsRecordingStore {
    fn directory(&self) -> &Path {
        &self.dir
    }

    fn list(&self) -> Result<Vec<Recording>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::ReadFailed {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut recordings: Vec<Recording> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Self::read_entry(entry.path()))
            .collect();
        recordings.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.path.cmp(&b.path)));

        debug!(dir = %self.dir.display(), count = recordings.len(), "scanned recordings");
        Ok(recordings)
    }

    fn create(&self, id: &RecordingId) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(id.file_name());
        let create_err = |e: std::io::Error| StoreError::CreateFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(create_err)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(create_err)?;
        Ok(path)
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let remove_err = |message: String| StoreError::RemoveFailed {
            path: path.display().to_string(),
            message,
        };

        if RecordingId::from_path(path).is_none() || path.parent() != Some(self.dir.as_path()) {
            return Err(remove_err("not a recording in this directory".to_string()));
        }
        fs::remove_file(path).map_err(|e| remove_err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_dir_is_app_folder() {
        let dir = default_recordings_dir();
        assert!(dir.ends_with("voice-memos"));
    }

    #[test]
    fn list_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_makes_empty_file_and_directory() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path().join("nested"));
        let id = RecordingId::generate();

        let path = store.create(&id).unwrap();

        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), id.file_name());
    }

    #[test]
    fn create_refuses_existing_file() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path());
        let id: RecordingId = "dup".parse().unwrap();
        store.create(&id).unwrap();
        assert!(matches!(
            store.create(&id),
            Err(StoreError::CreateFailed { .. })
        ));
    }

    #[test]
    fn list_filters_by_extension_and_kind() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.flac"), b"1234").unwrap();
        fs::write(tmp.path().join("b.wav"), b"x").unwrap();
        fs::write(tmp.path().join("c"), b"x").unwrap();
        fs::create_dir(tmp.path().join("d.flac")).unwrap();

        let store = FsRecordingStore::new(tmp.path());
        let listed = store.list().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_str(), "a");
        assert_eq!(listed[0].size_bytes, 4);
    }

    #[test]
    fn list_reflects_disk_each_time() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path());
        assert!(store.list().unwrap().is_empty());

        fs::write(tmp.path().join("late.flac"), b"x").unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn remove_deletes_recording() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path());
        let path = store.create(&RecordingId::generate()).unwrap();

        store.remove(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn remove_refuses_foreign_files() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path());

        let text = tmp.path().join("keep.txt");
        fs::write(&text, b"x").unwrap();
        let elsewhere = other.path().join("x.flac");
        fs::write(&elsewhere, b"x").unwrap();

        assert!(store.remove(&text).is_err());
        assert!(store.remove(&elsewhere).is_err());
        assert!(text.exists());
        assert!(elsewhere.exists());
    }

    #[test]
    fn remove_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let store = FsRecordingStore::new(tmp.path());
        assert!(matches!(
            store.remove(&tmp.path().join("gone.flac")),
            Err(StoreError::RemoveFailed { .. })
        ));
    }
}
