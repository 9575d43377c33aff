//! Live monitoring adapters

mod cpal_monitor;
mod noop;

pub use cpal_monitor::CpalMonitor;
pub use noop::NoOpMonitor;
