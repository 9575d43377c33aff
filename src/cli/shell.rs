//! Interactive session
//!
//! One prompt drives the whole manager: toggle recording, toggle playback of
//! a numbered item, delete items. Published snapshots are rendered as they
//! arrive, so a playback that reaches its end is reported without input.

use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::RecordingSessionManager;
use crate::domain::recording::format_elapsed;
use crate::domain::session::SessionSnapshot;

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

const HELP: &str = "\
  r          start / stop recording
  p N        play / stop recording N
  s          stop playback
  d N [M..]  delete recordings
  l          list recordings
  h          show this help
  q          quit";

/// A parsed shell line. Item numbers are 1-based as shown by `l`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    ToggleRecording,
    TogglePlayback(usize),
    StopPlayback,
    Delete(Vec<usize>),
    List,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };
        let numbers = words
            .map(|w| match w.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("not a recording number: {}", w)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let no_args = |command: ShellCommand| {
            if numbers.is_empty() {
                Ok(command)
            } else {
                Err(format!("'{}' takes no arguments", verb))
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "r" | "rec" | "record" => no_args(ShellCommand::ToggleRecording),
            "p" | "play" => match numbers.as_slice() {
                [n] => Ok(ShellCommand::TogglePlayback(*n)),
                _ => Err("usage: p N".to_string()),
            },
            "s" | "stop" => no_args(ShellCommand::StopPlayback),
            "d" | "del" | "delete" => {
                if numbers.is_empty() {
                    Err("usage: d N [M..]".to_string())
                } else {
                    Ok(ShellCommand::Delete(numbers))
                }
            }
            "l" | "ls" | "list" => no_args(ShellCommand::List),
            "h" | "?" | "help" => no_args(ShellCommand::Help),
            "q" | "quit" | "exit" => no_args(ShellCommand::Quit),
            other => Err(format!("unknown command '{}' (h for help)", other)),
        }
    }
}

/// Describe what changed between two published snapshots
pub fn describe_change(previous: &SessionSnapshot, current: &SessionSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    match (previous.is_recording, current.is_recording) {
        (false, true) => lines.push("● Recording...".to_string()),
        (true, false) => lines.push("■ Recording stopped".to_string()),
        _ => {}
    }

    if previous.currently_playing != current.currently_playing {
        if let Some(id) = &previous.currently_playing {
            lines.push(format!("■ Stopped playing {}", id));
        }
        if let Some(id) = &current.currently_playing {
            lines.push(format!("▶ Playing {}", id));
        }
    }

    let ids = |s: &SessionSnapshot| s.recordings.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
    if ids(previous) != ids(current) {
        lines.push(format!("{} recording(s)", current.recordings.len()));
    }

    lines
}

/// Run the interactive shell until `q`, end of input or Ctrl+C
pub async fn run_shell(manager: Arc<RecordingSessionManager>) -> std::process::ExitCode {
    let presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return std::process::ExitCode::from(EXIT_ERROR);
    }

    manager.request_permission().await;
    manager.load_recordings().await;

    presenter.info(&format!("Recordings in {}", manager.recordings_dir().display()));
    presenter.output(HELP);
    presenter.recordings(&manager.recordings(), None);

    let mut events = manager.subscribe();
    let mut last = events.borrow_and_update().clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        presenter.output_inline("> ");
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    _ => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => execute(&manager, &presenter, command).await,
                    Err(message) => presenter.warn(&message),
                }
                // Render whatever the command published before the next prompt
                if events.has_changed().unwrap_or(false) {
                    let current = events.borrow_and_update().clone();
                    render(&presenter, &last, &current);
                    last = current;
                }
            }
            changed = events.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = events.borrow_and_update().clone();
                presenter.output("");
                render(&presenter, &last, &current);
                last = current;
            }
            _ = shutdown.wait() => break,
        }
    }

    if manager.is_recording() {
        presenter.info("Saving recording in progress...");
        manager.stop_recording().await;
    }
    manager.stop_playback().await;
    presenter.output("");

    std::process::ExitCode::from(EXIT_SUCCESS)
}

fn render(presenter: &Presenter, previous: &SessionSnapshot, current: &SessionSnapshot) {
    for line in describe_change(previous, current) {
        presenter.info(&line);
    }
}

async fn execute(manager: &RecordingSessionManager, presenter: &Presenter, command: ShellCommand) {
    match command {
        ShellCommand::ToggleRecording => {
            if manager.is_recording() {
                presenter.info(&format!(
                    "Stopping after {}",
                    format_elapsed(manager.elapsed_ms())
                ));
            }
            manager.toggle_recording().await;
        }
        ShellCommand::TogglePlayback(number) => match manager.recordings().get(number - 1) {
            Some(recording) => {
                manager.toggle_playback(recording).await;
            }
            None => presenter.warn(&format!("No recording {}", number)),
        },
        ShellCommand::StopPlayback => manager.stop_playback().await,
        ShellCommand::Delete(numbers) => {
            let offsets: Vec<usize> = numbers.iter().map(|n| n - 1).collect();
            manager.delete_at(&offsets).await;
        }
        ShellCommand::List => {
            let snapshot = manager.snapshot();
            presenter.recordings(&snapshot.recordings, snapshot.currently_playing.as_ref());
        }
        ShellCommand::Help => presenter.output(HELP),
        ShellCommand::Quit => {}
    }
}
