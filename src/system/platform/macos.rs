use super::PlatformExtensions;
use crate::system::gpu::GpuBackend;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_backends() -> Vec<Box<dyn GpuBackend>> {
        // Apple GPUs expose no load counter without private frameworks.
        Vec::new()
    }
}
