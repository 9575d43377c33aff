//! Recording storage adapters

mod fs_store;

pub use fs_store::{default_recordings_dir, FsRecordingStore};
