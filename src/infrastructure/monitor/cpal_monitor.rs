//! Live input-to-output monitoring with cpal
//!
//! The input callback mixes frames to mono into a short queue; the output
//! callback drains it, applies the gain and fans each sample out to every
//! output channel. Both streams run at the input device's rate.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::ports::{MonitorError, MonitorTap};
use crate::infrastructure::audio_session::{AudioRoute, SharedRoute};

/// Upper bound on queued audio, in fractions of a second (1/5 s)
const MAX_LATENCY_DIVISOR: usize = 5;

/// Bounded sample queue between the input and output callbacks
struct MonitorQueue {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl MonitorQueue {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Queue a sample, dropping the oldest when full
    fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Next sample, or silence on underrun
    fn pop(&mut self) -> f32 {
        self.samples.pop_front().unwrap_or(0.0)
    }
}

type SharedQueue = Arc<StdMutex<MonitorQueue>>;

fn apply_gain(sample: f32, gain: f32) -> f32 {
    (sample * gain).clamp(-1.0, 1.0)
}

/// Monitoring tap over the routed input and output devices
pub struct CpalMonitor {
    route: SharedRoute,
    active: StdMutex<Option<mpsc::Sender<()>>>,
}

impl CpalMonitor {
    pub fn new(route: SharedRoute) -> Self {
        Self {
            route,
            active: StdMutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<mpsc::Sender<()>>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CpalMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl MonitorTap for CpalMonitor {
    async fn start(&self, gain: f32) -> Result<(), MonitorError> {
        if self.is_active() {
            return Ok(());
        }

        let route = self.route.get();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("voice-memos-monitor".to_string())
            .spawn(move || {
                let streams = match open_streams(&route, gain) {
                    Ok(streams) => {
                        let _ = ready_tx.send(Ok(()));
                        streams
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = stop_rx.recv();
                drop(streams);
            })
            .map_err(|e| MonitorError::StartFailed(e.to_string()))?;

        ready_rx
            .await
            .map_err(|_| MonitorError::StartFailed("Monitor thread exited".into()))??;

        info!(gain, "live monitoring started");
        *self.lock() = Some(stop_tx);
        Ok(())
    }

    fn stop(&self) {
        if let Some(stop) = self.lock().take() {
            let _ = stop.send(());
            debug!("live monitoring stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.lock().is_some()
    }
}

fn start_failed(e: impl std::fmt::Display) -> MonitorError {
    MonitorError::StartFailed(e.to_string())
}

fn open_streams(route: &AudioRoute, gain: f32) -> Result<(cpal::Stream, cpal::Stream), MonitorError> {
    let input = route.input().ok_or(MonitorError::NoInputDevice)?;
    let output = route.output().ok_or(MonitorError::NoOutputDevice)?;

    let input_default = input.default_input_config().map_err(start_failed)?;
    let output_default = output.default_output_config().map_err(start_failed)?;
    let sample_rate = input_default.sample_rate();

    let input_config: StreamConfig = input_default.config();
    let output_config = StreamConfig {
        channels: output_default.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    debug!(
        sample_rate = sample_rate.0,
        input_channels = input_config.channels,
        output_channels = output_config.channels,
        "opening monitor streams"
    );

    let queue: SharedQueue = Arc::new(StdMutex::new(MonitorQueue::new(
        sample_rate.0 as usize / MAX_LATENCY_DIVISOR,
    )));

    let input_stream = match input_default.sample_format() {
        SampleFormat::F32 => build_input::<f32>(&input, &input_config, Arc::clone(&queue)),
        SampleFormat::I16 => build_input::<i16>(&input, &input_config, Arc::clone(&queue)),
        other => Err(start_failed(format!("Unsupported input format: {:?}", other))),
    }?;
    let output_stream = match output_default.sample_format() {
        SampleFormat::F32 => build_output::<f32>(&output, &output_config, queue, gain),
        SampleFormat::I16 => build_output::<i16>(&output, &output_config, queue, gain),
        other => Err(start_failed(format!("Unsupported output format: {:?}", other))),
    }?;

    input_stream.play().map_err(start_failed)?;
    output_stream.play().map_err(start_failed)?;

    Ok((input_stream, output_stream))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: SharedQueue,
) -> Result<cpal::Stream, MonitorError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut queue) = queue.lock() {
                    for frame in data.chunks(channels) {
                        let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
                        queue.push(sum / frame.len() as f32);
                    }
                }
            },
            |err| warn!(error = %err, "monitor input stream error"),
            None,
        )
        .map_err(start_failed)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: SharedQueue,
    gain: f32,
) -> Result<cpal::Stream, MonitorError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut queue = queue.lock().ok();
                for frame in data.chunks_mut(channels) {
                    let sample = queue.as_mut().map(|q| q.pop()).unwrap_or(0.0);
                    let value = T::from_sample(apply_gain(sample, gain));
                    frame.iter_mut().for_each(|out| *out = value);
                }
            },
            |err| warn!(error = %err, "monitor output stream error"),
            None,
        )
        .map_err(start_failed)
}
