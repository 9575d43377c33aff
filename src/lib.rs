//! Voice Memos - record, list and play back microphone memos
//!
//! This crate captures microphone audio into FLAC files in a recordings
//! directory, lists them and plays them back, driven by a single recording
//! session manager.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the session state machine, config and errors
//! - **Application**: The session manager and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, flacenc, filesystem)
//! - **CLI**: Command-line interface, interactive shell and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
