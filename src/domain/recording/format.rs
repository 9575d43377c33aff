//! Fixed on-disk audio format

/// Sample rate written to every recording
pub const RECORDING_SAMPLE_RATE: u32 = 12_000;

/// Encoding parameters for captured audio.
///
/// Recordings are always FLAC, so the encoder is lossless and "quality" reduces
/// to the sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl RecordingFormat {
    /// 12 kHz, mono, 16-bit
    pub const fn voice_memo() -> Self {
        Self {
            sample_rate: RECORDING_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    /// Bytes of raw PCM per second of audio
    pub const fn pcm_bytes_per_sec(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }
}

impl Default for RecordingFormat {
    fn default() -> Self {
        Self::voice_memo()
    }
}
