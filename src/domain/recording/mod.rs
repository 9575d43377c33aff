//! Recording value objects

mod entry;
mod format;
mod time_limit;

pub use entry::{Recording, RecordingId, RECORDING_EXTENSION};
pub use format::{RecordingFormat, RECORDING_SAMPLE_RATE};
pub use time_limit::{format_elapsed, TimeLimit, MAX_TIME_LIMIT_SECS};
