//! Microphone permission probe

use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use tracing::debug;

use super::route::SharedRoute;
use crate::application::ports::MicrophonePermission;

/// Desktop hosts have no permission prompt; access counts as granted when the
/// routed input device can report an input configuration.
pub struct CpalPermission {
    route: SharedRoute,
}

impl CpalPermission {
    pub fn new(route: SharedRoute) -> Self {
        Self { route }
    }
}

#[async_trait]
impl MicrophonePermission for CpalPermission {
    async fn request(&self) -> bool {
        let route = self.route.get();
        tokio::task::spawn_blocking(move || {
            let Some(device) = route.input() else {
                debug!("no input device to probe");
                return false;
            };
            match device.default_input_config() {
                Ok(config) => {
                    debug!(
                        device = ?device.name().ok(),
                        sample_rate = config.sample_rate().0,
                        channels = config.channels(),
                        "input device accessible"
                    );
                    true
                }
                Err(e) => {
                    debug!(error = %e, "input device refused configuration query");
                    false
                }
            }
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn default_input_is_accessible() {
        let permission = CpalPermission::new(SharedRoute::new());
        assert!(permission.request().await);
    }
}
