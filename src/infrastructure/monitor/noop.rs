//! No-op monitoring adapter

use async_trait::async_trait;

use crate::application::ports::{MonitorError, MonitorTap};

/// Monitoring tap that routes nothing
///
/// Used for the baseline variant and when monitoring is disabled.
pub struct NoOpMonitor;

impl NoOpMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorTap for NoOpMonitor {
    async fn start(&self, _gain: f32) -> Result<(), MonitorError> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_active(&self) -> bool {
        false
    }
}
