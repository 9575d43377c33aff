//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::{format_elapsed, Recording, RecordingId};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Format recording progress, with a bar when a time limit is set
    pub fn format_progress(&self, elapsed_ms: u64, limit_ms: Option<u64>) -> String {
        let Some(total_ms) = limit_ms.filter(|&t| t > 0) else {
            return format_elapsed(elapsed_ms);
        };

        let percent = (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0);
        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {} / {}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            format_elapsed(elapsed_ms.min(total_ms)),
            format_elapsed(total_ms)
        )
    }

    /// Update recording progress
    pub fn update_recording_progress(&self, elapsed_ms: u64, limit_ms: Option<u64>) {
        let progress = self.format_progress(elapsed_ms, limit_ms);
        self.update_spinner(&format!("Recording... {}  (Enter to stop)", progress));
    }

    /// Format one line of the recordings table (`number` is 1-based)
    pub fn format_recording(&self, number: usize, recording: &Recording, playing: bool) -> String {
        let marker = if playing { "▶".green().to_string() } else { " ".to_string() };
        format!(
            "{} {:>3}  {}  {}  {:>9}",
            marker,
            number,
            recording.id.as_str().bold(),
            recording.created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            recording.human_readable_size()
        )
    }

    /// Print the recordings table to stdout
    pub fn recordings(&self, recordings: &[Recording], playing: Option<&RecordingId>) {
        if recordings.is_empty() {
            self.output(&"No recordings".dimmed().to_string());
            return;
        }
        for (index, recording) in recordings.iter().enumerate() {
            let is_playing = playing == Some(&recording.id);
            self.output(&self.format_recording(index + 1, recording, is_playing));
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
