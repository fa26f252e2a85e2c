use super::PlatformExtensions;
use crate::system::gpu::GpuBackend;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_backends() -> Vec<Box<dyn GpuBackend>> {
        // NVIDIA is covered by the `nvidia` feature; AMD ADL is not wired up.
        Vec::new()
    }
}
