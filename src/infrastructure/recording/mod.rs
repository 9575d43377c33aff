//! Recording infrastructure module
//!
//! Captures with cpal and writes lossless FLAC files.

mod cpal_recorder;
mod flac_encoder;

pub use cpal_recorder::CpalRecorder;
pub use flac_encoder::{encode_to_flac, EncodingError};
