//! Resolved device routing shared by the cpal/rodio adapters

use std::sync::{Arc, RwLock};

use cpal::traits::{DeviceTrait, HostTrait};
use tracing::debug;

/// Device names selected by the last session configuration.
///
/// `None` means "use the host default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioRoute {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl AudioRoute {
    /// Open the routed input device
    pub fn input(&self) -> Option<cpal::Device> {
        let host = cpal::default_host();
        match &self.input_device {
            Some(name) => find_device(host.input_devices().ok()?, name),
            None => host.default_input_device(),
        }
    }

    /// Open the routed output device
    pub fn output(&self) -> Option<cpal::Device> {
        let host = cpal::default_host();
        match &self.output_device {
            Some(name) => find_device(host.output_devices().ok()?, name),
            None => host.default_output_device(),
        }
    }
}

/// Pick the first device whose name matches `name`, case-insensitively
pub(super) fn find_device(
    devices: impl Iterator<Item = cpal::Device>,
    name: &str,
) -> Option<cpal::Device> {
    devices
        .filter(|d| d.name().map(|n| n.eq_ignore_ascii_case(name)).unwrap_or(false))
        .inspect(|d| debug!(device = ?d.name().ok(), "matched audio device"))
        .next()
}

/// Cloneable handle to the current route
#[derive(Debug, Clone, Default)]
pub struct SharedRoute(Arc<RwLock<AudioRoute>>);

impl SharedRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> AudioRoute {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, route: AudioRoute) {
        *self
            .0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = route;
    }
}
