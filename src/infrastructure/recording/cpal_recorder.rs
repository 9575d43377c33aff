//! Microphone capture using cpal
//!
//! The input stream lives on a dedicated thread because `cpal::Stream` is not
//! `Send`. Samples are mixed down to mono and buffered at the device rate;
//! resampling, FLAC encoding and the file write happen on stop.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};
use std::thread::JoinHandle;
use std::time::Instant;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::flac_encoder::encode_to_flac;
use crate::application::ports::{CaptureBackend, CaptureDelegate, CaptureSummary, RecordingError};
use crate::domain::recording::RecordingFormat;
use crate::infrastructure::audio_session::{AudioRoute, SharedRoute};

type SampleBuffer = Arc<StdMutex<Vec<i16>>>;

/// A running capture
struct Capture {
    path: PathBuf,
    format: RecordingFormat,
    started: Instant,
    device_rate: u32,
    buffer: SampleBuffer,
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl Capture {
    /// Wait for the stream thread, then encode and write the file
    fn finish(self) -> Result<CaptureSummary, RecordingError> {
        if self.thread.join().is_err() {
            warn!("capture thread panicked");
        }

        let samples = {
            let mut buffer = self
                .buffer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *buffer)
        };

        if samples.is_empty() {
            return Err(RecordingError::NoAudioCaptured);
        }

        let resampled = resample(&samples, self.device_rate, self.format.sample_rate)?;
        let bytes = encode_to_flac(&resampled, self.format)
            .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;

        std::fs::write(&self.path, &bytes).map_err(|e| {
            RecordingError::WriteFailed(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(CaptureSummary {
            path: self.path,
            samples: resampled.len() as u64,
            bytes_written: bytes.len() as u64,
        })
    }
}

/// Audio capture into a recording file using cpal
pub struct CpalRecorder {
    route: SharedRoute,
    active: StdMutex<Option<Capture>>,
}

impl CpalRecorder {
    /// Create a recorder that captures from the routed input device
    pub fn new(route: SharedRoute) -> Self {
        Self {
            route,
            active: StdMutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Capture>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CpalRecorder {
    fn drop(&mut self) {
        self.abort();
    }
}

#[async_trait]
impl CaptureBackend for CpalRecorder {
    async fn start(
        &self,
        path: &Path,
        format: RecordingFormat,
        delegate: Weak<dyn CaptureDelegate>,
    ) -> Result<(), RecordingError> {
        if self.is_capturing() {
            return Err(RecordingError::AlreadyCapturing);
        }

        let route = self.route.get();
        let buffer: SampleBuffer = Arc::new(StdMutex::new(Vec::new()));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        let thread = {
            let buffer = Arc::clone(&buffer);
            let path = path.to_path_buf();
            std::thread::Builder::new()
                .name("voice-memos-capture".to_string())
                .spawn(move || {
                    run_capture(route, format.sample_rate, buffer, path, delegate, ready_tx, stop_rx)
                })
                .map_err(|e| RecordingError::StartFailed(e.to_string()))?
        };

        let device_rate = match ready_rx.await {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(RecordingError::StartFailed(
                    "Capture thread exited before the stream started".into(),
                ))
            }
        };

        info!(path = %path.display(), device_rate, "capture started");
        *self.lock() = Some(Capture {
            path: path.to_path_buf(),
            format,
            started: Instant::now(),
            device_rate,
            buffer,
            stop_tx,
            thread,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<CaptureSummary, RecordingError> {
        let capture = self.lock().take().ok_or(RecordingError::NotCapturing)?;
        let _ = capture.stop_tx.send(());
        debug!(path = %capture.path.display(), elapsed_ms = capture.started.elapsed().as_millis() as u64, "capture stopping");

        // Encoding is CPU bound
        tokio::task::spawn_blocking(move || capture.finish())
            .await
            .map_err(|e| RecordingError::WriteFailed(format!("Encode task error: {}", e)))?
    }

    fn abort(&self) {
        if let Some(capture) = self.lock().take() {
            // The stream thread exits on its own; this may run on a cpal
            // callback thread, so it must not be joined here.
            let _ = capture.stop_tx.send(());
            debug!(path = %capture.path.display(), "capture aborted");
        }
    }

    fn is_capturing(&self) -> bool {
        self.lock().is_some()
    }

    fn elapsed_ms(&self) -> u64 {
        self.lock()
            .as_ref()
            .map(|c| c.started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Body of the capture thread: open the stream, report readiness, hold the
/// stream until told to stop.
fn run_capture(
    route: AudioRoute,
    target_rate: u32,
    buffer: SampleBuffer,
    path: PathBuf,
    delegate: Weak<dyn CaptureDelegate>,
    ready: oneshot::Sender<Result<u32, RecordingError>>,
    stop: mpsc::Receiver<()>,
) {
    let stream = match open_stream(&route, target_rate, buffer, path, delegate) {
        Ok((stream, rate)) => {
            let _ = ready.send(Ok(rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    // Returns on stop/abort, or when the recorder is dropped
    let _ = stop.recv();
    drop(stream);
}

fn open_stream(
    route: &AudioRoute,
    target_rate: u32,
    buffer: SampleBuffer,
    path: PathBuf,
    delegate: Weak<dyn CaptureDelegate>,
) -> Result<(cpal::Stream, u32), RecordingError> {
    let device = route.input().ok_or(RecordingError::NoAudioDevice)?;
    let (config, sample_format) = input_config(&device, target_rate)?;
    let channels = config.channels;
    debug!(
        device = ?device.name().ok(),
        sample_rate = config.sample_rate.0,
        channels,
        ?sample_format,
        "opening input stream"
    );

    let interrupted = AtomicBool::new(false);
    let on_error = move |err: cpal::StreamError| {
        error!(error = %err, "input stream error");
        if interrupted.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(delegate) = delegate.upgrade() {
            delegate.capture_interrupted(&path, &err.to_string());
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_samples(&buffer, &mix_to_mono(data, channels));
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let pcm: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                push_samples(&buffer, &mix_to_mono(&pcm, channels));
            },
            on_error,
            None,
        ),
        other => {
            return Err(RecordingError::StartFailed(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

    stream
        .play()
        .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

    Ok((stream, config.sample_rate.0))
}

fn push_samples(buffer: &SampleBuffer, samples: &[i16]) {
    if let Ok(mut buffer) = buffer.lock() {
        buffer.extend_from_slice(samples);
    }
}

/// Pick an input configuration, preferring fewer channels and a range that
/// contains `target_rate`
fn input_config(
    device: &cpal::Device,
    target_rate: u32,
) -> Result<(StreamConfig, SampleFormat), RecordingError> {
    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| RecordingError::StartFailed(format!("Failed to get configs: {}", e)))?;

    let includes_target = |c: &cpal::SupportedStreamConfigRange| {
        c.min_sample_rate().0 <= target_rate && c.max_sample_rate().0 >= target_rate
    };

    let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;
    for config in supported_configs {
        if config.sample_format() != SampleFormat::I16 && config.sample_format() != SampleFormat::F32
        {
            continue;
        }

        let is_better = match &best_config {
            None => true,
            Some(current) => {
                let fewer_channels = config.channels() < current.channels();
                let better_rate = includes_target(&config) && !includes_target(current);
                fewer_channels || better_rate
            }
        };
        if is_better {
            best_config = Some(config);
        }
    }

    let range = best_config.ok_or(RecordingError::StartFailed(
        "No suitable input config found".into(),
    ))?;

    let sample_rate = target_rate.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
    let config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok((config, range.sample_format()))
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Average interleaved frames down to one channel
fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Resample mono audio from the device rate to the recording rate
fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, RecordingError> {
    if source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| RecordingError::EncodeFailed(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());

        // The final chunk is padded with silence
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);
        let waves = vec![chunk];

        let resampled = resampler
            .process(&waves, None)
            .map_err(|e| RecordingError::EncodeFailed(format!("Resampling failed: {}", e)))?;

        output.extend(resampled[0].iter().map(|&s| f32_to_i16(s)));
        input_pos = end_pos;
    }

    output.truncate(output_len);

    Ok(output)
}
