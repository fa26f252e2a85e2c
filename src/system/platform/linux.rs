use std::fs;
use std::path::PathBuf;

use super::PlatformExtensions;
use crate::error::{Error, Result};
use crate::system::gpu::{GpuBackend, GpuHandle, Vendor};

const DRM_ROOT: &str = "/sys/class/drm";
const AMD_PCI_VENDOR: &str = "0x1002";

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_backends() -> Vec<Box<dyn GpuBackend>> {
        let mut backend = AmdSysfsBackend::new(DRM_ROOT);
        match backend.enumerate() {
            Ok(cards) if !cards.is_empty() => vec![Box::new(backend)],
            _ => Vec::new(),
        }
    }
}

/// AMD GPUs driven by `amdgpu`, read through `/sys/class/drm/cardN/device`.
pub struct AmdSysfsBackend {
    root: PathBuf,
}

impl AmdSysfsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn device_dir(&self, id: u32) -> PathBuf {
        self.root.join(format!("card{id}")).join("device")
    }
}

impl GpuBackend for AmdSysfsBackend {
    fn vendor(&self) -> Vendor {
        Vendor::Amd
    }

    fn enumerate(&mut self) -> Result<Vec<GpuHandle>> {
        let mut handles = Vec::new();
        for entry in fs::read_dir(&self.root)?.flatten() {
            let file_name = entry.file_name();
            // Connector entries look like "card0-DP-1".
            let Some(id) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix("card"))
                .and_then(|index| index.parse::<u32>().ok())
            else {
                continue;
            };
            let device = self.device_dir(id);
            let vendor = fs::read_to_string(device.join("vendor")).unwrap_or_default();
            if vendor.trim() != AMD_PCI_VENDOR {
                continue;
            }
            let name = fs::read_to_string(device.join("product_name"))
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "AMD GPU".to_string());
            handles.push(GpuHandle { id, name });
        }
        handles.sort_by_key(|h| h.id);
        Ok(handles)
    }

    fn load(&mut self, handle: &GpuHandle) -> Result<f64> {
        let path = self.device_dir(handle.id).join("gpu_busy_percent");
        let raw = fs::read_to_string(&path)?;
        raw.trim().parse::<f64>().map_err(|e| {
            Error::MetricUnavailable(format!("{}: {e}", path.display()))
        })
    }
}
