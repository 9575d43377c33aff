//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, AudioConfig, MAX_MONITOR_GAIN, MIN_MONITOR_GAIN, VALID_LOG_LEVELS};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_config_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    presenter.output(config_value(&config, key).as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, config_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Read one key as display text
fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    let audio = config.audio.as_ref();
    match key {
        "recordings_dir" => config.recordings_dir.clone(),
        "monitor" => config.monitor.map(|b| b.to_string()),
        "monitor_gain" => config.monitor_gain.map(|g| g.to_string()),
        "log_level" => config.log_level.clone(),
        "audio.input_device" => audio.and_then(|a| a.input_device.clone()),
        "audio.output_device" => audio.and_then(|a| a.output_device.clone()),
        "audio.default_to_speaker" => audio.and_then(|a| a.default_to_speaker).map(|b| b.to_string()),
        "audio.allow_bluetooth" => audio.and_then(|a| a.allow_bluetooth).map(|b| b.to_string()),
        _ => None,
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

fn bool_value(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))
}

/// Validate `value` and store it under `key`
fn apply_config_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "recordings_dir" => {
            if value.trim().is_empty() {
                return Err(invalid(key, "Path must not be empty"));
            }
            config.recordings_dir = Some(value.to_string());
        }
        "monitor" => config.monitor = Some(bool_value(key, value)?),
        "monitor_gain" => {
            let gain: f32 = value
                .parse()
                .map_err(|_| invalid(key, "Value must be a number"))?;
            if !(MIN_MONITOR_GAIN..=MAX_MONITOR_GAIN).contains(&gain) {
                return Err(invalid(
                    key,
                    format!("Value must be between {} and {}", MIN_MONITOR_GAIN, MAX_MONITOR_GAIN),
                ));
            }
            config.monitor_gain = Some(gain);
        }
        "log_level" => {
            let level = value.to_lowercase();
            if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                return Err(invalid(
                    key,
                    format!("Invalid value '{}'. Valid: {}", value, VALID_LOG_LEVELS.join(", ")),
                ));
            }
            config.log_level = Some(level);
        }
        audio_key => {
            let audio = config.audio.get_or_insert_with(AudioConfig::default);
            match audio_key {
                "audio.input_device" => audio.input_device = Some(value.to_string()),
                "audio.output_device" => audio.output_device = Some(value.to_string()),
                "audio.default_to_speaker" => {
                    audio.default_to_speaker = Some(bool_value(key, value)?)
                }
                "audio.allow_bluetooth" => audio.allow_bluetooth = Some(bool_value(key, value)?),
                _ => return Err(invalid(key, "Unknown key")),
            }
        }
    }
    Ok(())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
