//! Configuration value objects

mod app_config;

pub use app_config::{
    AppConfig, AudioConfig, DEFAULT_LOG_LEVEL, DEFAULT_MONITOR_GAIN, MAX_MONITOR_GAIN,
    MIN_MONITOR_GAIN, VALID_LOG_LEVELS,
};
