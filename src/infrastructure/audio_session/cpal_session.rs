//! cpal-backed audio session

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{debug, info};

use super::route::{find_device, AudioRoute, SharedRoute};
use crate::application::ports::{AudioSession, SessionError};
use crate::domain::session::SessionOptions;

/// Resolves devices for the session options and publishes them as the shared route
pub struct CpalAudioSession {
    route: SharedRoute,
}

impl CpalAudioSession {
    pub fn new(route: SharedRoute) -> Self {
        Self { route }
    }

    pub fn route(&self) -> &SharedRoute {
        &self.route
    }
}

fn is_bluetooth(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("bluetooth") || lower.contains("bluez")
}

/// Decide the device names for a configuration, given what the host offers.
///
/// Kept free of cpal so the routing rules can be tested without hardware.
fn plan_route(
    options: &SessionOptions,
    default_input: Option<&str>,
    input_exists: impl Fn(&str) -> bool,
    default_output: Option<&str>,
    output_exists: impl Fn(&str) -> bool,
) -> Result<AudioRoute, SessionError> {
    let input_device = match options.input_device.as_deref() {
        _ if !options.needs_input() => None,
        Some(name) => {
            if !options.allow_bluetooth && is_bluetooth(name) {
                return Err(SessionError::BluetoothNotAllowed(name.to_string()));
            }
            if !input_exists(name) {
                return Err(SessionError::DeviceNotFound(name.to_string()));
            }
            Some(name.to_string())
        }
        None => {
            let name = default_input.ok_or(SessionError::NoInputDevice)?;
            if !options.allow_bluetooth && is_bluetooth(name) {
                return Err(SessionError::BluetoothNotAllowed(name.to_string()));
            }
            None
        }
    };

    if !options.needs_output() {
        return Ok(AudioRoute {
            input_device,
            output_device: None,
        });
    }

    let output_device = match options.output_device.as_deref() {
        Some(_) if options.default_to_speaker => {
            default_output.ok_or(SessionError::NoOutputDevice)?;
            None
        }
        Some(name) => {
            if !options.allow_bluetooth && is_bluetooth(name) {
                return Err(SessionError::BluetoothNotAllowed(name.to_string()));
            }
            if !output_exists(name) {
                return Err(SessionError::DeviceNotFound(name.to_string()));
            }
            Some(name.to_string())
        }
        None => {
            default_output.ok_or(SessionError::NoOutputDevice)?;
            None
        }
    };

    Ok(AudioRoute {
        input_device,
        output_device,
    })
}

#[async_trait]
impl AudioSession for CpalAudioSession {
    async fn configure(&self, options: &SessionOptions) -> Result<(), SessionError> {
        let planned = options.clone();
        let mut route = tokio::task::spawn_blocking(move || {
            let host = cpal::default_host();
            let default_input = host.default_input_device().and_then(|d| d.name().ok());
            let default_output = host.default_output_device().and_then(|d| d.name().ok());
            debug!(
                host = ?host.id(),
                ?default_input,
                ?default_output,
                "configuring audio session"
            );

            plan_route(
                &planned,
                default_input.as_deref(),
                |name| {
                    host.input_devices()
                        .ok()
                        .and_then(|devices| find_device(devices, name))
                        .is_some()
                },
                default_output.as_deref(),
                |name| {
                    host.output_devices()
                        .ok()
                        .and_then(|devices| find_device(devices, name))
                        .is_some()
                },
            )
        })
        .await
        .map_err(|e| SessionError::Unavailable(format!("Task join error: {}", e)))??;

        if !options.needs_input() {
            // An output-only session leaves the capture side as it was
            route.input_device = self.route.get().input_device;
        }

        info!(
            category = ?options.category,
            input = ?route.input_device,
            output = ?route.output_device,
            "audio session configured"
        );
        self.route.set(route);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(options: &SessionOptions) -> Result<AudioRoute, SessionError> {
        plan_route(
            options,
            Some("Built-in Microphone"),
            |name| name == "USB Mic" || name == "Bluetooth Headset",
            Some("Built-in Speakers"),
            |name| name == "Headphones" || name == "Bluetooth Headset",
        )
    }

    #[test]
    fn defaults_route_to_host_devices() {
        let route = plan(&SessionOptions::extended()).unwrap();
        assert_eq!(route, AudioRoute::default());
    }

    #[test]
    fn configured_input_is_used() {
        let options = SessionOptions {
            input_device: Some("USB Mic".to_string()),
            ..SessionOptions::baseline()
        };
        let route = plan(&options).unwrap();
        assert_eq!(route.input_device.as_deref(), Some("USB Mic"));
    }

    #[test]
    fn missing_input_device_is_an_error() {
        let options = SessionOptions {
            input_device: Some("Nope".to_string()),
            ..SessionOptions::baseline()
        };
        assert!(matches!(plan(&options), Err(SessionError::DeviceNotFound(_))));
    }

    #[test]
    fn no_default_input_is_an_error() {
        let result = plan_route(
            &SessionOptions::baseline(),
            None,
            |_| false,
            Some("Speakers"),
            |_| false,
        );
        assert!(matches!(result, Err(SessionError::NoInputDevice)));
    }

    #[test]
    fn speaker_overrides_configured_output() {
        let options = SessionOptions {
            output_device: Some("Headphones".to_string()),
            ..SessionOptions::extended()
        };
        assert!(plan(&options).unwrap().output_device.is_none());

        let options = SessionOptions {
            output_device: Some("Headphones".to_string()),
            ..SessionOptions::baseline()
        };
        assert_eq!(
            plan(&options).unwrap().output_device.as_deref(),
            Some("Headphones")
        );
    }

    #[test]
    fn bluetooth_rejected_unless_allowed() {
        let options = SessionOptions {
            input_device: Some("Bluetooth Headset".to_string()),
            ..SessionOptions::baseline()
        };
        assert!(matches!(
            plan(&options),
            Err(SessionError::BluetoothNotAllowed(_))
        ));

        let options = SessionOptions {
            input_device: Some("Bluetooth Headset".to_string()),
            ..SessionOptions::extended()
        };
        assert!(plan(&options).is_ok());
    }

    #[test]
    fn playback_skips_input() {
        let options = SessionOptions::baseline().for_playback();
        let route = plan_route(&options, None, |_| false, Some("Speakers"), |_| false).unwrap();
        assert!(route.input_device.is_none());
    }

    #[test]
    fn playback_applies_output_rules() {
        let options = SessionOptions {
            output_device: Some("Bluetooth Headset".to_string()),
            ..SessionOptions::baseline()
        }
        .for_playback();
        assert!(matches!(
            plan(&options),
            Err(SessionError::BluetoothNotAllowed(_))
        ));

        let options = SessionOptions {
            output_device: Some("Headphones".to_string()),
            ..SessionOptions::baseline()
        }
        .for_playback();
        assert_eq!(
            plan(&options).unwrap().output_device.as_deref(),
            Some("Headphones")
        );

        let options = SessionOptions::baseline().for_playback();
        let result = plan_route(&options, Some("Mic"), |_| false, None, |_| false);
        assert!(matches!(result, Err(SessionError::NoOutputDevice)));
    }

    #[test]
    fn play_and_record_needs_output() {
        let result = plan_route(
            &SessionOptions::baseline(),
            Some("Mic"),
            |_| false,
            None,
            |_| false,
        );
        assert!(matches!(result, Err(SessionError::NoOutputDevice)));
    }

    #[tokio::test]
    #[ignore = "Requires audio hardware"]
    async fn configures_default_devices() {
        let session = CpalAudioSession::new(SharedRoute::new());
        assert!(session.configure(&SessionOptions::extended()).await.is_ok());
    }
}
