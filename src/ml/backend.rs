// Backend selection. Training runs on `Autodiff<Wgpu>` by default;
// `--cpu` switches to the NdArray backend, which is also what the
// unit tests use.

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};

pub type GpuBackend      = Autodiff<Wgpu>;
pub type GpuInferBackend = Wgpu;
pub type CpuBackend      = Autodiff<NdArray>;
pub type CpuInferBackend = NdArray;

/// Map an optional GPU index onto a WGPU device.
/// None lets WGPU pick its default adapter.
pub fn wgpu_device(gpu_id: Option<usize>) -> WgpuDevice {
    match gpu_id {
        Some(id) => WgpuDevice::DiscreteGpu(id),
        None     => WgpuDevice::default(),
    }
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
