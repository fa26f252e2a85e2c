//! Vendor-neutral GPU load interface.
//!
//! Each vendor backend enumerates its devices on every call; loads are never
//! cached because some drivers reset the counter when it is read.

use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Nvidia,
    Amd,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Nvidia => write!(f, "NVIDIA"),
            Vendor::Amd => write!(f, "AMD"),
        }
    }
}

/// One enumerated device, valid for the tick it was enumerated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuHandle {
    pub id: u32,
    pub name: String,
}

impl GpuHandle {
    /// Series key shown on the dashboard.
    pub fn key(&self) -> String {
        format!("{}-{}", self.name, self.id)
    }
}

pub trait GpuBackend: Send {
    fn vendor(&self) -> Vendor;

    fn enumerate(&mut self) -> Result<Vec<GpuHandle>>;

    /// Utilization in percent; may exceed 100 on some drivers.
    fn load(&mut self, handle: &GpuHandle) -> Result<f64>;
}

/// Every backend usable on this machine.
pub fn detect_backends() -> Vec<Box<dyn GpuBackend>> {
    let mut backends: Vec<Box<dyn GpuBackend>> = Vec::new();

    #[cfg(feature = "nvidia")]
    match nvidia::NvmlBackend::init() {
        Ok(backend) => backends.push(Box::new(backend)),
        Err(err) => tracing::debug!(error = %err, "NVML unavailable, skipping NVIDIA GPUs"),
    }

    backends.extend(super::platform::gpu_backends());

    for backend in &backends {
        tracing::info!(vendor = %backend.vendor(), "GPU backend enabled");
    }
    backends
}

#[cfg(feature = "nvidia")]
pub mod nvidia {
    use nvml_wrapper::Nvml;

    use super::{GpuBackend, GpuHandle, Vendor};
    use crate::error::{Error, Result};

    pub struct NvmlBackend {
        nvml: Nvml,
    }

    impl NvmlBackend {
        pub fn init() -> Result<Self> {
            let nvml = Nvml::init()
                .map_err(|e| Error::MetricUnavailable(format!("failed to initialize NVML: {e}")))?;
            Ok(Self { nvml })
        }
    }

    impl GpuBackend for NvmlBackend {
        fn vendor(&self) -> Vendor {
            Vendor::Nvidia
        }

        fn enumerate(&mut self) -> Result<Vec<GpuHandle>> {
            let count = self
                .nvml
                .device_count()
                .map_err(|e| Error::MetricUnavailable(format!("NVIDIA device count: {e}")))?;
            let mut handles = Vec::with_capacity(count as usize);
            for id in 0..count {
                let device = self.nvml.device_by_index(id).map_err(|e| {
                    Error::MetricUnavailable(format!("NVIDIA device {id}: {e}"))
                })?;
                let name = device.name().unwrap_or_else(|_| format!("NVIDIA GPU {id}"));
                handles.push(GpuHandle { id, name });
            }
            Ok(handles)
        }

        fn load(&mut self, handle: &GpuHandle) -> Result<f64> {
            let device = self.nvml.device_by_index(handle.id).map_err(|e| {
                Error::MetricUnavailable(format!("NVIDIA device {}: {e}", handle.id))
            })?;
            let utilization = device.utilization_rates().map_err(|e| {
                Error::MetricUnavailable(format!("NVIDIA utilization {}: {e}", handle.id))
            })?;
            Ok(f64::from(utilization.gpu))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_key_joins_name_and_id() {
        let handle = GpuHandle {
            id: 1,
            name: "Radeon RX 6800".to_string(),
        };
        assert_eq!(handle.key(), "Radeon RX 6800-1");
    }

    #[test]
    fn detect_backends_does_not_panic() {
        let _ = detect_backends();
    }
}
