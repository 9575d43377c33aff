//! Domain error types

use thiserror::Error;

/// Error when parsing a time limit string
#[derive(Debug, Clone, Error)]
#[error("Invalid time limit: \"{input}\". Expected <number>h, <number>m, <number>s or a combination (e.g., 45s, 2m, 1m30s)")]
pub struct TimeLimitParseError {
    pub input: String,
}

/// Error when a string cannot name a recording
#[derive(Debug, Clone, Error)]
#[error("Invalid recording id: \"{input}\"")]
pub struct RecordingIdError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
