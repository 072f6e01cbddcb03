//! Device selection for the image models.
//!
//! The device is chosen once, when a detector is constructed: a GPU if one
//! is detected and a GPU backend was compiled in, otherwise the CPU. There is
//! no fallback once a device has been picked.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::config::DeviceConfig;

/// Where the image models run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    /// GPU by adapter index
    Gpu(usize),
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Gpu(index) => write!(f, "gpu{}", index),
        }
    }
}

static SELECTED: OnceLock<Device> = OnceLock::new();

/// Picks the device for this process.
///
/// `gpu_backend_compiled` tells whether the caller was built with a GPU
/// tensor backend; without one a detected GPU is ignored. The first choice
/// is remembered and reported by [`selected_device`].
pub fn select_device(config: &DeviceConfig, gpu_backend_compiled: bool) -> Device {
    let gpu_present = config.prefer_gpu && is_gpu_available();
    let device = match (gpu_present, gpu_backend_compiled) {
        (true, true) => Device::Gpu(0),
        (true, false) => {
            warn!("GPU driver found but this build has no GPU backend, running on cpu");
            Device::Cpu
        }
        _ => Device::Cpu,
    };

    let _ = SELECTED.set(device);
    info!("Image models will run on {}", device);
    device
}

/// The device chosen by the first [`select_device`] call, if any
pub fn selected_device() -> Option<Device> {
    SELECTED.get().copied()
}

/// Driver paths whose presence means a usable GPU (NVIDIA, AMD)
#[cfg(target_os = "linux")]
const GPU_DRIVER_PATHS: [&str; 3] = [
    "/proc/driver/nvidia/version",
    "/dev/nvidia0",
    "/sys/module/amdgpu",
];

/// Best-effort check for a GPU driver; always false off Linux
pub fn is_gpu_available() -> bool {
    #[cfg(target_os = "linux")]
    {
        GPU_DRIVER_PATHS
            .iter()
            .any(|path| std::path::Path::new(path).exists())
    }

    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Gpu(1).to_string(), "gpu1");
    }

    #[test]
    fn test_cpu_when_gpu_not_preferred() {
        let config = DeviceConfig { prefer_gpu: false };
        assert_eq!(select_device(&config, true), Device::Cpu);
    }

    #[test]
    fn test_cpu_without_gpu_backend() {
        let config = DeviceConfig { prefer_gpu: true };
        assert_eq!(select_device(&config, false), Device::Cpu);
    }

    #[test]
    fn test_selection_is_remembered() {
        select_device(&DeviceConfig { prefer_gpu: false }, false);
        assert!(selected_device().is_some());
    }
}
