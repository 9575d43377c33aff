//! Recording session manager
//!
//! Orchestrates capture, playback, live monitoring and the recordings
//! directory, and publishes a [`SessionSnapshot`] after every change.
//!
//! Failures never reach observers as structured errors: each one is reduced to
//! a log line. `start_recording` additionally returns its error to the caller.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::config::AppConfig;
use crate::domain::recording::{Recording, RecordingFormat, RecordingId};
use crate::domain::session::{
    RecordingSession, SessionOptions, SessionSnapshot, SessionState, PlaybackToken,
};

use super::ports::{
    AudioSession, CaptureBackend, CaptureDelegate, MicrophonePermission, MonitorTap,
    PlaybackBackend, PlaybackDelegate, RecordingError, RecordingStore, SessionError, StoreError,
};

/// Why a capture could not be started
#[derive(Debug, Clone, Error)]
pub enum PlatformAudioError {
    #[error("Audio session configuration failed: {0}")]
    Session(#[from] SessionError),

    #[error("Could not create recording file: {0}")]
    FileCreation(#[from] StoreError),

    #[error("Could not start capture: {0}")]
    Capture(#[from] RecordingError),
}

/// Session manager settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub options: SessionOptions,
    pub format: RecordingFormat,
    /// Run the live monitoring tap while capturing
    pub monitoring: bool,
    pub monitor_gain: f32,
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            options: config.session_options(),
            format: RecordingFormat::voice_memo(),
            monitoring: config.monitor_or_default(),
            monitor_gain: config.monitor_gain_or_default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::defaults())
    }
}

/// Platform adapters the manager drives
pub struct SessionPorts {
    pub permission: Box<dyn MicrophonePermission>,
    pub audio_session: Box<dyn AudioSession>,
    pub recorder: Box<dyn CaptureBackend>,
    pub player: Box<dyn PlaybackBackend>,
    pub monitor: Box<dyn MonitorTap>,
    pub store: Box<dyn RecordingStore>,
}

struct SessionInner {
    session: RecordingSession,
    recordings: Vec<Recording>,
}

/// The recording session manager.
///
/// Always lives in an `Arc` so the audio backends can call back into it
/// through `Weak` delegate references. User intents are serialized by an async
/// lock; backend callbacks only take the short state lock.
///
/// Observers must not hold a `watch::Ref` from [`Self::subscribe`] while
/// calling into the manager.
pub struct RecordingSessionManager {
    ports: SessionPorts,
    config: SessionConfig,
    inner: StdMutex<SessionInner>,
    intents: Mutex<()>,
    published: watch::Sender<SessionSnapshot>,
    this: Weak<Self>,
}

impl RecordingSessionManager {
    pub fn new(ports: SessionPorts, config: SessionConfig) -> Arc<Self> {
        let (published, _) = watch::channel(SessionSnapshot::default());
        Arc::new_cyclic(|this| Self {
            ports,
            config,
            inner: StdMutex::new(SessionInner {
                session: RecordingSession::new(),
                recordings: Vec::new(),
            }),
            intents: Mutex::new(()),
            published,
            this: this.clone(),
        })
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.published.subscribe()
    }

    /// The last published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.published.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().session.state()
    }

    pub fn recordings(&self) -> Vec<Recording> {
        self.lock().recordings.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.lock().session.is_recording()
    }

    pub fn currently_playing(&self) -> Option<RecordingId> {
        self.lock().session.currently_playing().cloned()
    }

    pub fn is_playing(&self, recording: &Recording) -> bool {
        self.lock().session.is_playing(&recording.id)
    }

    pub fn recordings_dir(&self) -> &Path {
        self.ports.store.directory()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Elapsed time of the active capture in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.ports.recorder.elapsed_ms()
    }

    /// Ask for microphone access. Denial is only logged.
    #[instrument(skip(self))]
    pub async fn request_permission(&self) {
        if self.ports.permission.request().await {
            info!("microphone access granted");
        } else {
            warn!("microphone access denied; recording will not work");
        }
    }

    /// Start capturing if idle, stop if recording
    pub async fn toggle_recording(&self) {
        let _intent = self.intents.lock().await;
        if self.lock().session.is_recording() {
            self.stop_recording_inner().await;
        } else {
            // Already logged
            let _ = self.start_recording_inner().await;
        }
    }

    /// Configure the audio session, create a fresh file and start capturing into it
    pub async fn start_recording(&self) -> Result<(), PlatformAudioError> {
        let _intent = self.intents.lock().await;
        self.start_recording_inner().await
    }

    /// Stop capturing (and monitoring), then reload the list
    pub async fn stop_recording(&self) {
        let _intent = self.intents.lock().await;
        self.stop_recording_inner().await;
    }

    /// Rebuild the list from the recordings directory
    pub async fn load_recordings(&self) {
        let _intent = self.intents.lock().await;
        self.load_recordings_inner();
    }

    /// Stop `recording` if it is the playback target, otherwise play it
    pub async fn toggle_playback(&self, recording: &Recording) {
        let _intent = self.intents.lock().await;
        if self.lock().session.is_playing(&recording.id) {
            self.stop_playback_inner();
        } else {
            self.start_playback_inner(recording).await;
        }
    }

    /// Play `recording`, replacing any active playback
    pub async fn start_playback(&self, recording: &Recording) {
        let _intent = self.intents.lock().await;
        self.start_playback_inner(recording).await;
    }

    /// Stop the active playback and clear the playback target
    pub async fn stop_playback(&self) {
        let _intent = self.intents.lock().await;
        self.stop_playback_inner();
    }

    pub async fn delete_recording(&self, recording: &Recording) {
        self.delete_recordings(std::slice::from_ref(recording)).await;
    }

    /// Delete several recordings; a failure on one does not stop the rest
    pub async fn delete_recordings(&self, recordings: &[Recording]) {
        let _intent = self.intents.lock().await;
        self.delete_inner(recordings);
    }

    /// Delete by position in the current list
    pub async fn delete_at(&self, offsets: &[usize]) {
        let _intent = self.intents.lock().await;
        let targets: Vec<Recording> = {
            let inner = self.lock();
            offsets
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|index| {
                    let found = inner.recordings.get(index).cloned();
                    if found.is_none() {
                        warn!(index, "no recording at index");
                    }
                    found
                })
                .collect()
        };
        self.delete_inner(&targets);
    }

    async fn start_recording_inner(&self) -> Result<(), PlatformAudioError> {
        if self.lock().session.is_recording() {
            warn!("recording already in progress");
            return Ok(());
        }

        if let Err(e) = self.ports.audio_session.configure(&self.config.options).await {
            error!(error = %e, "failed to configure audio session");
            return Err(e.into());
        }

        let id = RecordingId::generate();
        let path = match self.ports.store.create(&id) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "failed to create recording file");
                return Err(e.into());
            }
        };

        let delegate: Weak<dyn CaptureDelegate> = self.this.clone();
        if let Err(e) = self
            .ports
            .recorder
            .start(&path, self.config.format, delegate)
            .await
        {
            error!(error = %e, "failed to start capture");
            self.discard_file(&path);
            return Err(e.into());
        }

        if self.config.monitoring {
            if let Err(e) = self.ports.monitor.start(self.config.monitor_gain).await {
                warn!(error = %e, "live monitoring unavailable");
            }
        }

        let mut inner = self.lock();
        if let Err(e) = inner.session.begin_capture(id.clone(), path.clone()) {
            // Unreachable while intents are serialized; undo rather than leak
            error!(error = %e, "capture started twice");
            drop(inner);
            self.ports.monitor.stop();
            self.ports.recorder.abort();
            self.discard_file(&path);
            return Ok(());
        }
        info!(id = %id, path = %path.display(), "recording started");
        self.publish(&inner);
        Ok(())
    }

    async fn stop_recording_inner(&self) {
        let capture = self.lock().session.end_capture();
        self.ports.monitor.stop();

        match capture {
            Ok(capture) => match self.ports.recorder.stop().await {
                Ok(summary) => info!(
                    id = %capture.id,
                    bytes = summary.bytes_written,
                    duration_ms = summary.duration_ms(self.config.format),
                    "recording saved"
                ),
                Err(e) => {
                    error!(id = %capture.id, error = %e, "failed to finish recording");
                    self.discard_file(&capture.path);
                }
            },
            Err(e) => debug!(error = %e, "stop requested with no active capture"),
        }

        self.load_recordings_inner();
    }

    fn load_recordings_inner(&self) {
        let listed = match self.ports.store.list() {
            Ok(recordings) => recordings,
            Err(e) => {
                error!(error = %e, "failed to load recordings");
                Vec::new()
            }
        };

        let mut inner = self.lock();
        // A capture in progress is not a recording until it is stopped
        let capturing = inner.session.active_capture().map(|c| c.path.clone());
        inner.recordings = listed
            .into_iter()
            .filter(|r| capturing.as_ref() != Some(&r.path))
            .collect();
        debug!(count = inner.recordings.len(), "recordings loaded");
        self.publish(&inner);
    }

    async fn start_playback_inner(&self, recording: &Recording) {
        let options = self.config.options.for_playback();
        if let Err(e) = self.ports.audio_session.configure(&options).await {
            error!(id = %recording.id, error = %e, "failed to configure audio output");
            return;
        }

        // The target is set before the player starts so a completion that
        // arrives during `play` is not lost
        let (token, previous) = {
            let mut inner = self.lock();
            let token = inner.session.next_playback_token();
            let previous = inner.session.begin_playback(recording.id.clone(), token);
            (token, previous)
        };

        let delegate: Weak<dyn PlaybackDelegate> = self.this.clone();
        match self.ports.player.play(&recording.path, token, delegate).await {
            Ok(()) => {
                info!(id = %recording.id, "playback started");
                self.publish(&self.lock());
            }
            Err(e) => {
                error!(id = %recording.id, error = %e, "failed to play recording");
                let mut inner = self.lock();
                if inner.session.finish_playback(token).is_none() {
                    return;
                }
                let Some(previous) = previous else {
                    return;
                };
                // Checked under the state lock: the player marks a playback
                // finished before reporting it, so a completion either shows
                // here or arrives after the restore with a matching token
                if self.ports.player.is_active() {
                    inner.session.begin_playback(previous.id, previous.token);
                } else {
                    info!(id = %previous.id, "playback finished");
                    self.publish(&inner);
                }
            }
        }
    }

    fn stop_playback_inner(&self) {
        self.ports.player.stop();
        let mut inner = self.lock();
        if let Some(playback) = inner.session.end_playback() {
            info!(id = %playback.id, "playback stopped");
        }
        self.publish(&inner);
    }

    fn delete_inner(&self, recordings: &[Recording]) {
        for recording in recordings {
            let (playing, capturing) = {
                let inner = self.lock();
                (
                    inner.session.is_playing(&recording.id),
                    inner
                        .session
                        .active_capture()
                        .is_some_and(|c| c.path == recording.path),
                )
            };
            if capturing {
                warn!(id = %recording.id, "refusing to delete the recording in progress");
                continue;
            }
            if playing {
                self.stop_playback_inner();
            }
            match self.ports.store.remove(&recording.path) {
                Ok(()) => info!(id = %recording.id, "recording deleted"),
                Err(e) => error!(id = %recording.id, error = %e, "failed to delete recording"),
            }
        }
        self.load_recordings_inner();
    }

    fn discard_file(&self, path: &Path) {
        if let Err(e) = self.ports.store.remove(path) {
            warn!(path = %path.display(), error = %e, "failed to remove incomplete recording");
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, inner: &SessionInner) {
        self.published.send_replace(SessionSnapshot {
            recordings: inner.recordings.clone(),
            is_recording: inner.session.is_recording(),
            currently_playing: inner.session.currently_playing().cloned(),
        });
    }
}

impl PlaybackDelegate for RecordingSessionManager {
    fn playback_finished(&self, token: PlaybackToken, successfully: bool) {
        let mut inner = self.lock();
        match inner.session.finish_playback(token) {
            Some(playback) => {
                if successfully {
                    info!(id = %playback.id, "playback finished");
                } else {
                    warn!(id = %playback.id, "playback ended early");
                }
                self.publish(&inner);
            }
            None => debug!(token = token.value(), "ignoring stale playback completion"),
        }
    }
}

impl CaptureDelegate for RecordingSessionManager {
    fn capture_interrupted(&self, path: &Path, reason: &str) {
        let ended = self.lock().session.end_capture_at(path);
        let Some(capture) = ended else {
            debug!(path = %path.display(), "ignoring interruption of inactive capture");
            return;
        };

        error!(id = %capture.id, reason, "capture interrupted");
        self.ports.recorder.abort();
        self.ports.monitor.stop();
        self.discard_file(&capture.path);
        self.load_recordings_inner();
    }
}

impl Drop for RecordingSessionManager {
    fn drop(&mut self) {
        self.ports.player.stop();
        self.ports.monitor.stop();
        if self.ports.recorder.is_capturing() {
            self.ports.recorder.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::application::ports::{CaptureSummary, MonitorError, PlaybackError};
    use crate::domain::session::SessionCategory;
    use crate::infrastructure::storage::FsRecordingStore;

    #[derive(Clone)]
    struct MockPermission(bool);

    #[async_trait]
    impl MicrophonePermission for MockPermission {
        async fn request(&self) -> bool {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct MockSession {
        fail: bool,
        /// Refuse output-only configuration
        fail_playback: bool,
        configured: Arc<StdMutex<Vec<SessionCategory>>>,
    }

    #[async_trait]
    impl AudioSession for MockSession {
        async fn configure(&self, options: &SessionOptions) -> Result<(), SessionError> {
            self.configured.lock().unwrap().push(options.category);
            if self.fail {
                Err(SessionError::NoInputDevice)
            } else if self.fail_playback && !options.needs_input() {
                Err(SessionError::NoOutputDevice)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Clone, Default)]
    struct MockRecorder {
        fail_start: bool,
        fail_stop: bool,
        capturing: Arc<AtomicBool>,
        path: Arc<StdMutex<Option<PathBuf>>>,
        aborted: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptureBackend for MockRecorder {
        async fn start(
            &self,
            path: &Path,
            _format: RecordingFormat,
            _delegate: Weak<dyn CaptureDelegate>,
        ) -> Result<(), RecordingError> {
            if self.fail_start {
                return Err(RecordingError::NoAudioDevice);
            }
            self.capturing.store(true, Ordering::SeqCst);
            *self.path.lock().unwrap() = Some(path.to_path_buf());
            Ok(())
        }

        async fn stop(&self) -> Result<CaptureSummary, RecordingError> {
            self.capturing.store(false, Ordering::SeqCst);
            let path = self
                .path
                .lock()
                .unwrap()
                .take()
                .ok_or(RecordingError::NotCapturing)?;
            if self.fail_stop {
                return Err(RecordingError::NoAudioCaptured);
            }
            std::fs::write(&path, b"fLaC-test").unwrap();
            Ok(CaptureSummary {
                path,
                samples: 12_000,
                bytes_written: 9,
            })
        }

        fn abort(&self) {
            self.capturing.store(false, Ordering::SeqCst);
            self.path.lock().unwrap().take();
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }

        fn is_capturing(&self) -> bool {
            self.capturing.load(Ordering::SeqCst)
        }

        fn elapsed_ms(&self) -> u64 {
            0
        }
    }

    type ActivePlay = (PathBuf, PlaybackToken, Weak<dyn PlaybackDelegate>);

    #[derive(Clone, Default)]
    struct MockPlayer {
        /// File name the player refuses to open
        fail_on: Option<String>,
        /// Let the current playback reach its end while a failing play is pending
        finish_during_failed_play: bool,
        active: Arc<StdMutex<Option<ActivePlay>>>,
        started: Arc<StdMutex<Vec<PathBuf>>>,
        /// Whether the playing file still existed when stop() was called
        file_present_at_stop: Arc<StdMutex<Vec<bool>>>,
    }

    impl MockPlayer {
        fn active_path(&self) -> Option<PathBuf> {
            self.active.lock().unwrap().as_ref().map(|a| a.0.clone())
        }

        /// Simulate the file playing to its end
        fn finish(&self) {
            let active = self.active.lock().unwrap().take();
            if let Some((_, token, delegate)) = active {
                if let Some(delegate) = delegate.upgrade() {
                    delegate.playback_finished(token, true);
                }
            }
        }
    }

    #[async_trait]
    impl PlaybackBackend for MockPlayer {
        async fn play(
            &self,
            path: &Path,
            token: PlaybackToken,
            delegate: Weak<dyn PlaybackDelegate>,
        ) -> Result<(), PlaybackError> {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            if self.fail_on.is_some() && self.fail_on == name {
                if self.finish_during_failed_play {
                    self.finish();
                }
                return Err(PlaybackError::DecodeFailed("bad file".into()));
            }
            self.started.lock().unwrap().push(path.to_path_buf());
            *self.active.lock().unwrap() = Some((path.to_path_buf(), token, delegate));
            Ok(())
        }

        fn stop(&self) {
            if let Some((path, _, _)) = self.active.lock().unwrap().take() {
                self.file_present_at_stop.lock().unwrap().push(path.exists());
            }
        }

        fn is_active(&self) -> bool {
            self.active.lock().unwrap().is_some()
        }
    }

    #[derive(Clone, Default)]
    struct MockMonitor {
        active: Arc<AtomicBool>,
        starts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MonitorTap for MockMonitor {
        async fn start(&self, _gain: f32) -> Result<(), MonitorError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {
            self.active.store(false, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        dir: TempDir,
        session: MockSession,
        recorder: MockRecorder,
        player: MockPlayer,
        monitor: MockMonitor,
        manager: Arc<RecordingSessionManager>,
    }

    struct Setup {
        session: MockSession,
        recorder: MockRecorder,
        player: MockPlayer,
        permission: bool,
        config: SessionConfig,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                session: MockSession::default(),
                recorder: MockRecorder::default(),
                player: MockPlayer::default(),
                permission: true,
                config: SessionConfig::default(),
            }
        }
    }

    fn harness_with(setup: Setup) -> Harness {
        let dir = TempDir::new().unwrap();
        let monitor = MockMonitor::default();
        let ports = SessionPorts {
            permission: Box::new(MockPermission(setup.permission)),
            audio_session: Box::new(setup.session.clone()),
            recorder: Box::new(setup.recorder.clone()),
            player: Box::new(setup.player.clone()),
            monitor: Box::new(monitor.clone()),
            store: Box::new(FsRecordingStore::new(dir.path())),
        };
        Harness {
            manager: RecordingSessionManager::new(ports, setup.config),
            dir,
            session: setup.session,
            recorder: setup.recorder,
            player: setup.player,
            monitor,
        }
    }

    fn harness() -> Harness {
        harness_with(Setup::default())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn write_recording(dir: &Path, name: &str) {
        std::fs::write(dir.join(format!("{}.flac", name)), b"fLaC").unwrap();
    }

    #[tokio::test]
    async fn start_then_stop_leaves_exactly_one_new_file() {
        let h = harness();
        write_recording(h.dir.path(), "existing");
        h.manager.load_recordings().await;
        assert_eq!(h.manager.recordings().len(), 1);

        h.manager.start_recording().await.unwrap();
        assert!(h.manager.is_recording());
        h.manager.stop_recording().await;
        h.manager.load_recordings().await;

        assert!(!h.manager.is_recording());
        let recordings = h.manager.recordings();
        assert_eq!(recordings.len(), 2);
        let new: Vec<_> = recordings
            .iter()
            .filter(|r| r.id.as_str() != "existing")
            .collect();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].path.extension().unwrap(), "flac");
    }

    #[tokio::test]
    async fn toggle_recording_starts_and_stops() {
        let h = harness();
        h.manager.toggle_recording().await;
        assert_eq!(h.manager.state(), SessionState::Recording);
        h.manager.toggle_recording().await;
        assert_eq!(h.manager.state(), SessionState::Idle);
        assert_eq!(h.manager.recordings().len(), 1);
    }

    #[tokio::test]
    async fn session_failure_stays_idle_without_file() {
        let h = harness_with(Setup {
            session: MockSession {
                fail: true,
                ..Default::default()
            },
            ..Default::default()
        });

        let err = h.manager.start_recording().await.unwrap_err();
        assert!(matches!(err, PlatformAudioError::Session(_)));
        assert!(!h.manager.is_recording());
        assert!(files_in(h.dir.path()).is_empty());
    }

    #[tokio::test]
    async fn capture_start_failure_removes_created_file() {
        let h = harness_with(Setup {
            recorder: MockRecorder {
                fail_start: true,
                ..Default::default()
            },
            ..Default::default()
        });

        let err = h.manager.start_recording().await.unwrap_err();
        assert!(matches!(err, PlatformAudioError::Capture(_)));
        assert_eq!(h.manager.state(), SessionState::Idle);
        assert!(files_in(h.dir.path()).is_empty());
        assert!(!h.monitor.is_active());
    }

    #[tokio::test]
    async fn failed_finalize_discards_partial_file() {
        let h = harness_with(Setup {
            recorder: MockRecorder {
                fail_stop: true,
                ..Default::default()
            },
            ..Default::default()
        });

        h.manager.start_recording().await.unwrap();
        h.manager.stop_recording().await;

        assert!(!h.manager.is_recording());
        assert!(files_in(h.dir.path()).is_empty());
        assert!(h.manager.recordings().is_empty());
    }

    #[tokio::test]
    async fn start_while_recording_is_a_no_op() {
        let h = harness();
        h.manager.start_recording().await.unwrap();
        h.manager.start_recording().await.unwrap();
        assert_eq!(files_in(h.dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn monitoring_follows_capture() {
        let h = harness();
        h.manager.start_recording().await.unwrap();
        assert!(h.monitor.is_active());
        h.manager.stop_recording().await;
        assert!(!h.monitor.is_active());
    }

    #[tokio::test]
    async fn monitoring_disabled_in_baseline_config() {
        let h = harness_with(Setup {
            config: SessionConfig {
                monitoring: false,
                ..Default::default()
            },
            ..Default::default()
        });
        h.manager.start_recording().await.unwrap();
        assert_eq!(h.monitor.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recording_in_progress_is_not_listed() {
        let h = harness();
        h.manager.start_recording().await.unwrap();
        h.manager.load_recordings().await;
        assert!(h.manager.recordings().is_empty());
        assert_eq!(files_in(h.dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn toggle_playback_twice_returns_to_idle() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        h.manager.load_recordings().await;
        let x = h.manager.recordings()[0].clone();

        h.manager.toggle_playback(&x).await;
        assert!(h.manager.is_playing(&x));
        h.manager.toggle_playback(&x).await;

        assert!(!h.manager.is_playing(&x));
        assert_eq!(h.manager.state(), SessionState::Idle);
        assert!(!h.player.is_active());
    }

    #[tokio::test]
    async fn toggling_another_recording_replaces_target() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        write_recording(h.dir.path(), "y");
        h.manager.load_recordings().await;
        let snapshot = h.manager.snapshot();
        let x = snapshot.find(&"x".parse().unwrap()).unwrap().clone();
        let y = snapshot.find(&"y".parse().unwrap()).unwrap().clone();

        h.manager.toggle_playback(&x).await;
        h.manager.toggle_playback(&y).await;

        assert_eq!(h.manager.currently_playing(), Some(y.id.clone()));
        assert!(!h.manager.is_playing(&x));
        assert_eq!(h.player.active_path(), Some(y.path.clone()));
    }

    #[tokio::test]
    async fn failed_playback_keeps_previous_target() {
        let h = harness_with(Setup {
            player: MockPlayer {
                fail_on: Some("bad.flac".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        write_recording(h.dir.path(), "good");
        write_recording(h.dir.path(), "bad");
        h.manager.load_recordings().await;
        let snapshot = h.manager.snapshot();
        let good = snapshot.find(&"good".parse().unwrap()).unwrap().clone();
        let bad = snapshot.find(&"bad".parse().unwrap()).unwrap().clone();

        h.manager.start_playback(&good).await;
        h.manager.start_playback(&bad).await;

        assert_eq!(h.manager.currently_playing(), Some(good.id.clone()));
        assert_eq!(h.manager.snapshot().currently_playing, Some(good.id));
        assert_eq!(h.player.active_path(), Some(good.path));
    }

    #[tokio::test]
    async fn previous_ending_during_failed_play_clears_target() {
        let h = harness_with(Setup {
            player: MockPlayer {
                fail_on: Some("bad.flac".to_string()),
                finish_during_failed_play: true,
                ..Default::default()
            },
            ..Default::default()
        });
        write_recording(h.dir.path(), "good");
        write_recording(h.dir.path(), "bad");
        h.manager.load_recordings().await;
        let snapshot = h.manager.snapshot();
        let good = snapshot.find(&"good".parse().unwrap()).unwrap().clone();
        let bad = snapshot.find(&"bad".parse().unwrap()).unwrap().clone();

        h.manager.start_playback(&good).await;
        let mut rx = h.manager.subscribe();
        rx.borrow_and_update();
        h.manager.start_playback(&bad).await;

        assert!(h.manager.currently_playing().is_none());
        assert_eq!(h.manager.state(), SessionState::Idle);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().currently_playing.is_none());
        assert!(!h.player.is_active());
    }

    #[tokio::test]
    async fn playback_configures_output_first() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        h.manager.load_recordings().await;
        let x = h.manager.recordings()[0].clone();

        h.manager.start_playback(&x).await;

        assert_eq!(
            *h.session.configured.lock().unwrap(),
            vec![SessionCategory::Playback]
        );
        assert!(h.manager.is_playing(&x));
    }

    #[tokio::test]
    async fn rejected_output_route_prevents_playback() {
        let h = harness_with(Setup {
            session: MockSession {
                fail_playback: true,
                ..Default::default()
            },
            ..Default::default()
        });
        write_recording(h.dir.path(), "x");
        h.manager.load_recordings().await;
        let x = h.manager.recordings()[0].clone();
        let before = h.manager.snapshot();

        h.manager.toggle_playback(&x).await;

        assert!(h.player.started.lock().unwrap().is_empty());
        assert!(!h.manager.is_playing(&x));
        assert_eq!(h.manager.snapshot(), before);
    }

    #[tokio::test]
    async fn names_differing_only_in_whitespace_are_separate_recordings() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        write_recording(h.dir.path(), " x");
        write_recording(h.dir.path(), "   ");
        h.manager.load_recordings().await;

        let recordings = h.manager.recordings();
        assert_eq!(recordings.len(), 3);
        let by_name = |name: &str| {
            recordings
                .iter()
                .find(|r| r.path == h.dir.path().join(name))
                .unwrap()
                .clone()
        };
        let plain = by_name("x.flac");
        let padded = by_name(" x.flac");
        assert_ne!(plain.id, padded.id);

        h.manager.toggle_playback(&plain).await;
        h.manager.toggle_playback(&padded).await;
        assert_eq!(h.manager.currently_playing(), Some(padded.id.clone()));
        assert_eq!(h.player.active_path(), Some(padded.path.clone()));

        h.manager.delete_recording(&plain).await;
        assert!(h.manager.is_playing(&padded));
        assert_eq!(h.player.active_path(), Some(padded.path));
        assert!(h.player.file_present_at_stop.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn natural_completion_matches_explicit_stop() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        h.manager.load_recordings().await;
        let x = h.manager.recordings()[0].clone();

        h.manager.start_playback(&x).await;
        h.manager.stop_playback().await;
        let after_stop = h.manager.snapshot();

        h.manager.start_playback(&x).await;
        let mut rx = h.manager.subscribe();
        rx.borrow_and_update();
        h.player.finish();

        assert!(rx.has_changed().unwrap());
        let after_finish = rx.borrow_and_update().clone();
        assert_eq!(after_finish, after_stop);
        assert!(h.manager.currently_playing().is_none());
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        write_recording(h.dir.path(), "y");
        h.manager.load_recordings().await;
        let snapshot = h.manager.snapshot();
        let x = snapshot.find(&"x".parse().unwrap()).unwrap().clone();
        let y = snapshot.find(&"y".parse().unwrap()).unwrap().clone();

        h.manager.start_playback(&x).await;
        let stale = h.player.active.lock().unwrap().as_ref().unwrap().1;
        h.manager.start_playback(&y).await;

        h.manager.playback_finished(stale, true);
        assert_eq!(h.manager.currently_playing(), Some(y.id));
    }

    #[tokio::test]
    async fn deleting_playing_recording_stops_playback_first() {
        let h = harness();
        write_recording(h.dir.path(), "x");
        h.manager.load_recordings().await;
        let x = h.manager.recordings()[0].clone();

        h.manager.start_playback(&x).await;
        h.manager.delete_recording(&x).await;

        assert_eq!(*h.player.file_present_at_stop.lock().unwrap(), vec![true]);
        assert!(h.manager.currently_playing().is_none());
        assert!(!x.path.exists());
        assert!(h.manager.recordings().is_empty());
    }

    #[tokio::test]
    async fn bulk_delete_continues_past_failures() {
        let h = harness();
        for name in ["a", "b", "c"] {
            write_recording(h.dir.path(), name);
        }
        h.manager.load_recordings().await;
        // Remove one behind the manager's back so its delete fails
        let b = h.manager.snapshot().find(&"b".parse().unwrap()).unwrap().clone();
        std::fs::remove_file(&b.path).unwrap();

        h.manager.delete_at(&[0, 1, 2, 7]).await;

        assert!(files_in(h.dir.path()).is_empty());
        assert!(h.manager.recordings().is_empty());
    }

    #[tokio::test]
    async fn list_ignores_other_extensions() {
        let h = harness();
        write_recording(h.dir.path(), "keep");
        std::fs::write(h.dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(h.dir.path().join("old.m4a"), b"x").unwrap();
        std::fs::create_dir(h.dir.path().join("folder.flac")).unwrap();

        h.manager.load_recordings().await;

        let ids: Vec<_> = h
            .manager
            .recordings()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn missing_directory_loads_empty_list() {
        let h = harness();
        let path = h.dir.path().to_path_buf();
        drop(h.dir);
        h.manager.load_recordings().await;
        assert!(h.manager.recordings().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn capture_interruption_returns_to_idle() {
        let h = harness();
        h.manager.start_recording().await.unwrap();
        let path = h.recorder.path.lock().unwrap().clone().unwrap();

        h.manager.capture_interrupted(&path, "device unplugged");

        assert!(!h.manager.is_recording());
        assert!(!h.monitor.is_active());
        assert_eq!(h.recorder.aborted.load(Ordering::SeqCst), 1);
        assert!(files_in(h.dir.path()).is_empty());
        assert!(!h.manager.snapshot().is_recording);
    }

    #[tokio::test]
    async fn interruption_for_other_path_is_ignored() {
        let h = harness();
        h.manager.start_recording().await.unwrap();
        h.manager
            .capture_interrupted(Path::new("/elsewhere.flac"), "noise");
        assert!(h.manager.is_recording());
    }

    #[tokio::test]
    async fn subscribers_see_every_mutation() {
        let h = harness();
        let mut rx = h.manager.subscribe();

        h.manager.start_recording().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_recording);

        h.manager.stop_recording().await;
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(!snapshot.is_recording);
        assert_eq!(snapshot.recordings.len(), 1);
    }

    #[tokio::test]
    async fn permission_denial_changes_nothing() {
        let h = harness_with(Setup {
            permission: false,
            ..Default::default()
        });
        let before = h.manager.snapshot();
        h.manager.request_permission().await;
        assert_eq!(h.manager.snapshot(), before);
        assert_eq!(h.manager.state(), SessionState::Idle);
    }
}
