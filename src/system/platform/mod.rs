use super::gpu::GpuBackend;

pub trait PlatformExtensions {
    /// GPU backends that only exist on this OS.
    fn gpu_backends() -> Vec<Box<dyn GpuBackend>>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

#[cfg(target_os = "linux")]
pub use linux::AmdSysfsBackend;

pub fn gpu_backends() -> Vec<Box<dyn GpuBackend>> {
    platform_impl::Platform::gpu_backends()
}
