//! Recording identity and metadata

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::error::RecordingIdError;

/// Extension every recording file carries
pub const RECORDING_EXTENSION: &str = "flac";

/// Unique recording name; the file stem of `<id>.flac`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordingId(String);

impl RecordingId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name this id is stored under
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, RECORDING_EXTENSION)
    }

    /// Derive the id from a path, if it names a recording file.
    ///
    /// The stem is kept byte for byte: two files whose names differ only in
    /// whitespace are two recordings.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext != RECORDING_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        is_valid_stem(stem).then(|| Self(stem.to_string()))
    }
}

fn is_valid_stem(stem: &str) -> bool {
    !stem.is_empty() && stem != "." && stem != ".." && !stem.contains(['/', '\\', '\0'])
}

/// Parses a user-typed id; surrounding whitespace is ignored.
impl FromStr for RecordingId {
    type Err = RecordingIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_valid_stem(trimmed) {
            return Err(RecordingIdError {
                input: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recording persisted in the recordings directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recording {
    pub id: RecordingId,
    pub path: PathBuf,
    pub created: DateTime<Utc>,
    pub size_bytes: u64,
}

impl Recording {
    pub fn new(id: RecordingId, path: PathBuf, created: DateTime<Utc>, size_bytes: u64) -> Self {
        Self {
            id,
            path,
            created,
            size_bytes,
        }
    }

    /// File name as shown to users
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.file_name())
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = RecordingId::generate();
        let b = RecordingId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn file_name_uses_fixed_extension() {
        let id: RecordingId = "memo-1".parse().unwrap();
        assert_eq!(id.file_name(), "memo-1.flac");
    }

    #[test]
    fn from_path_requires_extension() {
        assert_eq!(
            RecordingId::from_path(Path::new("/tmp/abc.flac")),
            Some("abc".parse().unwrap())
        );
        assert!(RecordingId::from_path(Path::new("/tmp/abc.m4a")).is_none());
        assert!(RecordingId::from_path(Path::new("/tmp/abc")).is_none());
        assert!(RecordingId::from_path(Path::new("/tmp/abc.FLAC")).is_none());
    }

    #[test]
    fn from_path_keeps_whitespace_in_stem() {
        let plain = RecordingId::from_path(Path::new("/tmp/x.flac")).unwrap();
        let padded = RecordingId::from_path(Path::new("/tmp/ x.flac")).unwrap();
        assert_ne!(plain, padded);
        assert_eq!(padded.as_str(), " x");

        let blank = RecordingId::from_path(Path::new("/tmp/   .flac")).unwrap();
        assert_eq!(blank.file_name(), "   .flac");
    }

    #[test]
    fn parse_trims_typed_input() {
        let id: RecordingId = "  memo \n".parse().unwrap();
        assert_eq!(id.as_str(), "memo");
        assert!("   ".parse::<RecordingId>().is_err());
    }

    #[test]
    fn parse_rejects_path_like_input() {
        assert!("".parse::<RecordingId>().is_err());
        assert!("..".parse::<RecordingId>().is_err());
        assert!("a/b".parse::<RecordingId>().is_err());
        assert!("a\\b".parse::<RecordingId>().is_err());
    }

    #[test]
    fn human_readable_size() {
        let id: RecordingId = "x".parse().unwrap();
        let mut rec = Recording::new(id, PathBuf::from("x.flac"), Utc::now(), 512);
        assert_eq!(rec.human_readable_size(), "512 B");
        rec.size_bytes = 2048;
        assert_eq!(rec.human_readable_size(), "2.0 KB");
        rec.size_bytes = 3 * 1024 * 1024;
        assert_eq!(rec.human_readable_size(), "3.0 MB");
    }

    #[test]
    fn file_name_comes_from_path() {
        let id: RecordingId = "x".parse().unwrap();
        let rec = Recording::new(id, PathBuf::from("/data/x.flac"), Utc::now(), 0);
        assert_eq!(rec.file_name(), "x.flac");
    }
}
