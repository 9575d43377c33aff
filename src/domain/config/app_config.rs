//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::session::{SessionCategory, SessionOptions};

/// Monitoring gain applied when none is configured
pub const DEFAULT_MONITOR_GAIN: f32 = 1.0;
pub const MIN_MONITOR_GAIN: f32 = 0.0;
pub const MAX_MONITOR_GAIN: f32 = 2.0;

pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Audio routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub default_to_speaker: Option<bool>,
    pub allow_bluetooth: Option<bool>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub recordings_dir: Option<String>,
    pub monitor: Option<bool>,
    pub monitor_gain: Option<f32>,
    pub log_level: Option<String>,
    pub audio: Option<AudioConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            recordings_dir: None,
            monitor: Some(true),
            monitor_gain: Some(DEFAULT_MONITOR_GAIN),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            audio: Some(AudioConfig {
                input_device: None,
                output_device: None,
                default_to_speaker: Some(true),
                allow_bluetooth: Some(true),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            monitor: other.monitor.or(self.monitor),
            monitor_gain: other.monitor_gain.or(self.monitor_gain),
            log_level: other.log_level.or(self.log_level),
            audio: Self::merge_audio_config(self.audio, other.audio),
        }
    }

    fn merge_audio_config(
        base: Option<AudioConfig>,
        other: Option<AudioConfig>,
    ) -> Option<AudioConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(AudioConfig {
                input_device: o.input_device.or(b.input_device),
                output_device: o.output_device.or(b.output_device),
                default_to_speaker: o.default_to_speaker.or(b.default_to_speaker),
                allow_bluetooth: o.allow_bluetooth.or(b.allow_bluetooth),
            }),
        }
    }

    /// Configured recordings directory, if any
    pub fn recordings_dir(&self) -> Option<PathBuf> {
        self.recordings_dir
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Get monitor setting, or true if not set
    pub fn monitor_or_default(&self) -> bool {
        self.monitor.unwrap_or(true)
    }

    /// Get monitor gain, falling back to the default when unset or out of range
    pub fn monitor_gain_or_default(&self) -> f32 {
        self.monitor_gain
            .filter(|g| (MIN_MONITOR_GAIN..=MAX_MONITOR_GAIN).contains(g))
            .unwrap_or(DEFAULT_MONITOR_GAIN)
    }

    /// Get log level, or "warn" if not set/invalid
    pub fn log_level_or_default(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|l| VALID_LOG_LEVELS.contains(l))
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    fn audio_flag(&self, pick: impl Fn(&AudioConfig) -> Option<bool>) -> bool {
        self.audio.as_ref().and_then(pick).unwrap_or(false)
    }

    /// Build the audio session options for a capture
    pub fn session_options(&self) -> SessionOptions {
        let audio = self.audio.clone().unwrap_or_default();
        SessionOptions {
            category: SessionCategory::PlayAndRecord,
            default_to_speaker: self.audio_flag(|a| a.default_to_speaker),
            allow_bluetooth: self.audio_flag(|a| a.allow_bluetooth),
            input_device: audio.input_device.filter(|s| !s.is_empty()),
            output_device: audio.output_device.filter(|s| !s.is_empty()),
        }
    }
}
