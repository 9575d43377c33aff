//! Command runners
//!
//! Every command builds one [`RecordingSessionManager`] over the platform
//! adapters and drives it through its intent methods.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;
use tracing::debug;

use crate::application::ports::{ConfigStore, MonitorTap};
use crate::application::{RecordingSessionManager, SessionConfig, SessionPorts};
use crate::domain::config::AppConfig;
use crate::domain::recording::{Recording, RecordingId, TimeLimit};
use crate::infrastructure::{
    default_recordings_dir, CpalAudioSession, CpalMonitor, CpalPermission, CpalRecorder,
    FsRecordingStore, NoOpMonitor, RodioPlayer, SharedRoute, XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

const PROGRESS_TICK: StdDuration = StdDuration::from_millis(100);

/// Load and merge configuration from file and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < cli (env is folded into cli by clap)
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Build the session manager over the desktop audio adapters
pub fn build_manager(config: &AppConfig) -> Arc<RecordingSessionManager> {
    let route = SharedRoute::new();
    let session_config = SessionConfig::from_app_config(config);
    let dir = effective_recordings_dir(config);
    debug!(dir = %dir.display(), monitoring = session_config.monitoring, "building session");

    let monitor: Box<dyn MonitorTap> = if session_config.monitoring {
        Box::new(CpalMonitor::new(route.clone()))
    } else {
        Box::new(NoOpMonitor::new())
    };

    let ports = SessionPorts {
        permission: Box::new(CpalPermission::new(route.clone())),
        audio_session: Box::new(CpalAudioSession::new(route.clone())),
        recorder: Box::new(CpalRecorder::new(route.clone())),
        player: Box::new(RodioPlayer::new(route)),
        monitor,
        store: Box::new(FsRecordingStore::new(dir)),
    };

    RecordingSessionManager::new(ports, session_config)
}

/// Resolve a user-supplied target: a 1-based list number or a recording id
pub fn resolve_target<'a>(recordings: &'a [Recording], target: &str) -> Option<&'a Recording> {
    let target = target.trim();
    if let Ok(number) = target.parse::<usize>() {
        return number.checked_sub(1).and_then(|index| recordings.get(index));
    }
    let file_stem = target.strip_suffix(".flac").unwrap_or(target);
    recordings.iter().find(|r| r.id.as_str() == file_stem)
}

/// Resolve every target or report the ones that do not match
pub fn resolve_targets(
    recordings: &[Recording],
    targets: &[String],
) -> Result<Vec<Recording>, Vec<String>> {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut seen = HashSet::new();
    for target in targets {
        match resolve_target(recordings, target) {
            Some(recording) => {
                if seen.insert(recording.id.clone()) {
                    found.push(recording.clone());
                }
            }
            None => missing.push(target.clone()),
        }
    }
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(missing)
    }
}

/// Record one memo
pub async fn run_record(
    manager: Arc<RecordingSessionManager>,
    limit: Option<TimeLimit>,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    manager.request_permission().await;
    manager.load_recordings().await;
    let before: HashSet<RecordingId> = manager.recordings().into_iter().map(|r| r.id).collect();

    if let Err(e) = manager.start_recording().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let limit_ms = limit.map(|l| l.as_millis());
    presenter.start_spinner("Recording...  (Enter to stop)");

    let mut events = manager.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = interval(PROGRESS_TICK);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let elapsed = manager.elapsed_ms();
                presenter.update_recording_progress(elapsed, limit_ms);
                if limit_ms.is_some_and(|limit| elapsed >= limit) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => break,
                // No terminal: only a signal or the time limit ends the recording
                _ => stdin_open = false,
            },
            _ = shutdown.wait() => break,
            changed = events.changed() => {
                if changed.is_err() || !manager.is_recording() {
                    presenter.spinner_fail("Recording was interrupted");
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
    }

    presenter.update_spinner("Saving...");
    manager.stop_recording().await;

    match manager.recordings().into_iter().find(|r| !before.contains(&r.id)) {
        Some(recording) => {
            presenter.spinner_success(&format!(
                "Saved {} ({})",
                recording.path.display(),
                recording.human_readable_size()
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        None => {
            presenter.spinner_fail("Recording was not saved");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Print the recordings
pub async fn run_list(manager: Arc<RecordingSessionManager>, json: bool) -> ExitCode {
    let presenter = Presenter::new();
    manager.load_recordings().await;
    let recordings = manager.recordings();

    if json {
        match serde_json::to_string_pretty(&recordings) {
            Ok(text) => presenter.output(&text),
            Err(e) => {
                presenter.error(&format!("Failed to serialize recordings: {}", e));
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        presenter.recordings(&recordings, None);
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Play one recording until it finishes or the user interrupts
pub async fn run_play(manager: Arc<RecordingSessionManager>, target: &str) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    manager.load_recordings().await;
    let recordings = manager.recordings();
    let Some(recording) = resolve_target(&recordings, target).cloned() else {
        presenter.error(&format!("No recording matches '{}'", target));
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    let mut events = manager.subscribe();
    manager.start_playback(&recording).await;
    if !manager.is_playing(&recording) {
        presenter.error(&format!("Could not play {}", recording.file_name()));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.start_spinner(&format!("Playing {}  (Ctrl+C to stop)", recording.file_name()));

    loop {
        tokio::select! {
            changed = events.changed() => {
                let still_playing = events.borrow_and_update().currently_playing.as_ref() == Some(&recording.id);
                if changed.is_err() || !still_playing {
                    presenter.spinner_success(&format!("Finished {}", recording.file_name()));
                    return ExitCode::from(EXIT_SUCCESS);
                }
            }
            _ = shutdown.wait() => {
                manager.stop_playback().await;
                presenter.spinner_success("Stopped");
                return ExitCode::from(EXIT_SUCCESS);
            }
        }
    }
}

/// Delete recordings by number or id
pub async fn run_delete(manager: Arc<RecordingSessionManager>, targets: &[String]) -> ExitCode {
    let presenter = Presenter::new();

    manager.load_recordings().await;
    let recordings = manager.recordings();
    let targets = match resolve_targets(&recordings, targets) {
        Ok(targets) => targets,
        Err(missing) => {
            presenter.error(&format!("No recording matches: {}", missing.join(", ")));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    manager.delete_recordings(&targets).await;

    let remaining: HashSet<RecordingId> =
        manager.recordings().into_iter().map(|r| r.id).collect();
    let mut failed = 0;
    for recording in &targets {
        if remaining.contains(&recording.id) {
            presenter.error(&format!("Failed to delete {}", recording.file_name()));
            failed += 1;
        } else {
            presenter.success(&format!("Deleted {}", recording.file_name()));
        }
    }

    if failed == 0 {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Configured recordings directory, or the platform default
pub fn effective_recordings_dir(config: &AppConfig) -> PathBuf {
    config.recordings_dir().unwrap_or_else(default_recordings_dir)
}
