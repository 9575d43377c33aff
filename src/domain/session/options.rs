//! Audio session options

/// What the audio session is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionCategory {
    /// Output only, used before playback
    Playback,
    /// Simultaneous input and output (needed for monitoring and overlapping playback)
    #[default]
    PlayAndRecord,
}

/// Routing options applied when the session is configured before a capture or playback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub category: SessionCategory,
    /// Route output to the host's default output device, ignoring a configured one
    pub default_to_speaker: bool,
    /// Accept Bluetooth devices for input and output
    pub allow_bluetooth: bool,
    /// Preferred input device name
    pub input_device: Option<String>,
    /// Preferred output device name
    pub output_device: Option<String>,
}

impl SessionOptions {
    /// Play-and-record with speaker and Bluetooth routing enabled
    pub fn extended() -> Self {
        Self {
            category: SessionCategory::PlayAndRecord,
            default_to_speaker: true,
            allow_bluetooth: true,
            input_device: None,
            output_device: None,
        }
    }

    /// Play-and-record with no routing options
    pub fn baseline() -> Self {
        Self {
            category: SessionCategory::PlayAndRecord,
            ..Default::default()
        }
    }

    /// The same routing narrowed to the output side
    pub fn for_playback(&self) -> Self {
        Self {
            category: SessionCategory::Playback,
            ..self.clone()
        }
    }

    pub fn needs_input(&self) -> bool {
        self.category == SessionCategory::PlayAndRecord
    }

    pub fn needs_output(&self) -> bool {
        matches!(
            self.category,
            SessionCategory::Playback | SessionCategory::PlayAndRecord
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_enables_routing_options() {
        let options = SessionOptions::extended();
        assert!(options.default_to_speaker);
        assert!(options.allow_bluetooth);
        assert!(options.needs_output());
    }

    #[test]
    fn baseline_uses_defaults() {
        let options = SessionOptions::baseline();
        assert!(!options.default_to_speaker);
        assert!(!options.allow_bluetooth);
        assert_eq!(options.category, SessionCategory::PlayAndRecord);
    }

    #[test]
    fn playback_keeps_routing_but_drops_input() {
        let options = SessionOptions {
            output_device: Some("Headphones".to_string()),
            ..SessionOptions::baseline()
        };
        let playback = options.for_playback();
        assert_eq!(playback.category, SessionCategory::Playback);
        assert_eq!(playback.output_device.as_deref(), Some("Headphones"));
        assert!(!playback.allow_bluetooth);
        assert!(!playback.needs_input());
        assert!(playback.needs_output());
    }
}
