//! Backend abstraction
//!
//! NdArray (CPU) by default, Wgpu when built with the `wgpu` feature.
//! The device is resolved once from [`DeviceConfig`]; there is no fallback
//! after that.

use burn::backend::Autodiff;
use burn::tensor::backend::Backend;
use landwatch_core::{select_device, Device, DeviceConfig};

#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray;

/// The autodiff backend for training
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Maps the selected device onto the compiled backend's device
pub fn burn_device(config: &DeviceConfig) -> <InferenceBackend as Backend>::Device {
    let device = select_device(config, cfg!(feature = "wgpu"));
    to_backend_device(device)
}

#[cfg(feature = "wgpu")]
fn to_backend_device(device: Device) -> <InferenceBackend as Backend>::Device {
    use burn::backend::wgpu::WgpuDevice;

    match device {
        Device::Gpu(index) => WgpuDevice::DiscreteGpu(index),
        Device::Cpu => WgpuDevice::Cpu,
    }
}

#[cfg(not(feature = "wgpu"))]
fn to_backend_device(_device: Device) -> <InferenceBackend as Backend>::Device {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

/// Get the default device
pub fn default_device() -> <InferenceBackend as Backend>::Device {
    <InferenceBackend as Backend>::Device::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "wgpu")]
    {
        "Wgpu (GPU)"
    }

    #[cfg(not(feature = "wgpu"))]
    {
        "NdArray (CPU)"
    }
}

#[cfg(all(test, not(feature = "wgpu")))]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_backend_device() {
        let device = burn_device(&DeviceConfig { prefer_gpu: true });
        assert_eq!(device, burn::backend::ndarray::NdArrayDevice::Cpu);
        assert_eq!(backend_name(), "NdArray (CPU)");
    }
}
