//! Rodio-based playback adapter
//!
//! Each playback owns a thread holding the `OutputStream` (not `Send`) and a
//! `Sink`. The thread watches the sink and reports natural completion.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::application::ports::{PlaybackBackend, PlaybackDelegate, PlaybackError};
use crate::domain::session::PlaybackToken;
use crate::infrastructure::audio_session::{AudioRoute, SharedRoute};

/// How often the playback thread checks for stop or end of stream
const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct Playback {
    token: PlaybackToken,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

/// Plays recordings through the routed output device
pub struct RodioPlayer {
    route: SharedRoute,
    active: StdMutex<Option<Playback>>,
}

impl RodioPlayer {
    pub fn new(route: SharedRoute) -> Self {
        Self {
            route,
            active: StdMutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Playback>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl PlaybackBackend for RodioPlayer {
    async fn play(
        &self,
        path: &Path,
        token: PlaybackToken,
        delegate: Weak<dyn PlaybackDelegate>,
    ) -> Result<(), PlaybackError> {
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        {
            let route = self.route.get();
            let path = path.to_path_buf();
            let stop = Arc::clone(&stop);
            let finished = Arc::clone(&finished);
            std::thread::Builder::new()
                .name("voice-memos-playback".to_string())
                .spawn(move || {
                    run_playback(route, path, token, delegate, stop, finished, ready_tx)
                })
                .map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;
        }

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(PlaybackError::PlaybackFailed(
                    "Playback thread exited before output started".into(),
                ))
            }
        }

        let previous = self.lock().replace(Playback {
            token,
            stop,
            finished,
        });
        if let Some(previous) = previous {
            previous.stop.store(true, Ordering::SeqCst);
            debug!(token = previous.token.value(), "replaced playback");
        }
        info!(path = %path.display(), token = token.value(), "playback started");
        Ok(())
    }

    fn stop(&self) {
        if let Some(playback) = self.lock().take() {
            // The thread may be the one calling us through the delegate, so
            // it is only signalled, never joined.
            playback.stop.store(true, Ordering::SeqCst);
            debug!(token = playback.token.value(), "playback stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::SeqCst))
    }
}

fn open_output(route: &AudioRoute) -> Result<(OutputStream, rodio::OutputStreamHandle), PlaybackError> {
    let result = match route.output() {
        Some(device) if route.output_device.is_some() => OutputStream::try_from_device(&device),
        _ => OutputStream::try_default(),
    };
    result.map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path)
        .map_err(|e| PlaybackError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| PlaybackError::DecodeFailed(format!("{}: {}", path.display(), e)))
}

fn run_playback(
    route: AudioRoute,
    path: PathBuf,
    token: PlaybackToken,
    delegate: Weak<dyn PlaybackDelegate>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<(), PlaybackError>>,
) {
    let setup = open_decoder(&path).and_then(|source| {
        let (stream, handle) = open_output(&route)?;
        let sink =
            Sink::try_new(&handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;
        sink.append(source);
        Ok((stream, sink))
    });

    let (_stream, sink) = match setup {
        Ok(playing) => {
            let _ = ready.send(Ok(()));
            playing
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    loop {
        if stop.load(Ordering::SeqCst) {
            sink.stop();
            return;
        }
        if sink.empty() {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    finished.store(true, Ordering::SeqCst);
    if stop.load(Ordering::SeqCst) {
        return;
    }
    debug!(path = %path.display(), token = token.value(), "end of stream");
    if let Some(delegate) = delegate.upgrade() {
        delegate.playback_finished(token, true);
    }
}
