//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Voice Memos - record, list and play back microphone memos
#[derive(Parser, Debug)]
#[command(name = "voice-memos")]
#[command(version)]
#[command(about = "Record, list and play back voice memos")]
#[command(long_about = None)]
pub struct Cli {
    /// Recordings directory
    #[arg(long, global = true, value_name = "PATH", env = "VOICE_MEMOS_DIR")]
    pub dir: Option<PathBuf>,

    /// Subcommand (defaults to the interactive shell)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a new memo until Enter, Ctrl+C or the time limit
    Record {
        /// Stop automatically after this long (e.g., 30s, 2m, 1m30s)
        #[arg(short = 'd', long, value_name = "TIME")]
        duration: Option<String>,

        /// Route the microphone to the speakers while recording
        #[arg(long, conflicts_with = "no_monitor")]
        monitor: bool,

        /// Do not route the microphone to the speakers
        #[arg(long)]
        no_monitor: bool,
    },
    /// List recordings, oldest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Play a recording until it ends or Ctrl+C
    Play {
        /// Recording number (from `list`) or id
        target: String,
    },
    /// Delete one or more recordings
    Delete {
        /// Recording numbers (from `list`) or ids
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Interactive session: record, play and delete from one prompt
    Shell,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Monitoring override from `--monitor` / `--no-monitor`
    pub fn monitor_override(&self) -> Option<bool> {
        match self {
            Commands::Record { monitor: true, .. } => Some(true),
            Commands::Record {
                no_monitor: true, ..
            } => Some(false),
            _ => None,
        }
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "recordings_dir",
    "monitor",
    "monitor_gain",
    "log_level",
    "audio.input_device",
    "audio.output_device",
    "audio.default_to_speaker",
    "audio.allow_bluetooth",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
