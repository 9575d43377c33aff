//! Voice Memos CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use voice_memos::cli::{
    app::{load_merged_config, run_delete, run_list, run_play, run_record},
    args::{Cli, Commands},
    build_manager,
    config_cmd::handle_config_command,
    run_shell, Presenter, EXIT_ERROR, EXIT_USAGE_ERROR,
};
use voice_memos::domain::config::{AppConfig, DEFAULT_LOG_LEVEL};
use voice_memos::domain::recording::TimeLimit;
use voice_memos::infrastructure::XdgConfigStore;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "VOICE_MEMOS_LOG";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("voice_memos={}", level))
}

/// Install the subscriber before anything logs.
///
/// Returns a handle for swapping in the configured level, or `None` when
/// `VOICE_MEMOS_LOG` decides the filter.
fn init_tracing() -> Option<FilterHandle> {
    let (filter, from_env) = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => (filter, true),
        Err(_) => (crate_filter(DEFAULT_LOG_LEVEL), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    (!from_env).then_some(handle)
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter_handle = init_tracing();
    let presenter = Presenter::new();
    let command = cli.command.unwrap_or(Commands::Shell);

    // Build CLI config from args
    let cli_config = AppConfig {
        recordings_dir: cli.dir.map(|d| d.to_string_lossy().into_owned()),
        monitor: command.monitor_override(),
        ..Default::default()
    };

    // Merge config
    let config = load_merged_config(cli_config).await;
    if let Some(handle) = filter_handle {
        if let Err(e) = handle.reload(crate_filter(config.log_level_or_default())) {
            presenter.warn(&format!("Could not apply log level: {}", e));
        }
    }

    match command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Record { duration, .. } => {
            let limit = match duration.as_deref().map(str::parse::<TimeLimit>) {
                None => None,
                Some(Ok(limit)) => Some(limit),
                Some(Err(e)) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };
            run_record(build_manager(&config), limit).await
        }
        Commands::List { json } => run_list(build_manager(&config), json).await,
        Commands::Play { target } => run_play(build_manager(&config), &target).await,
        Commands::Delete { targets } => run_delete(build_manager(&config), &targets).await,
        Commands::Shell => run_shell(build_manager(&config)).await,
    }
}
