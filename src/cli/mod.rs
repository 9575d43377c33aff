//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the interactive shell and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod shell;
pub mod signals;

// Re-export commonly used types
pub use app::{build_manager, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
pub use shell::run_shell;
