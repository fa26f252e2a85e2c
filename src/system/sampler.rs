use std::collections::HashMap;

use tracing::{debug, trace};

use super::collector::{HostProbe, NetworkTotals};
use super::gpu::GpuBackend;
use super::process::{ProcessIdentity, ProcessUsage};
use super::snapshot::{NetworkDelta, Reading};
use crate::config::MetricSelection;
use crate::error::Error;

const BYTES_PER_MB: f64 = 1_000_000.0;

/// Clamp a percentage into `[0, 100]`; non-finite readings become gaps.
pub fn clamp_percent(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

/// Turns cumulative byte counters into per-tick deltas.
#[derive(Debug, Default)]
pub struct NetworkCounter {
    last: NetworkTotals,
}

impl NetworkCounter {
    /// Counters that went backwards (reset, interface removed) report zero
    /// for this tick and become the new baseline.
    pub fn delta(&mut self, current: NetworkTotals) -> NetworkDelta {
        let received = current.received_bytes.saturating_sub(self.last.received_bytes);
        let sent = current.sent_bytes.saturating_sub(self.last.sent_bytes);
        self.last = current;
        NetworkDelta {
            received_mb: received as f64 / BYTES_PER_MB,
            sent_mb: sent as f64 / BYTES_PER_MB,
        }
    }
}

pub struct Sampler<P: HostProbe> {
    probe: P,
    gpus: Vec<Box<dyn GpuBackend>>,
    network: NetworkCounter,
    root_pid: u32,
    metrics: MetricSelection,
}

impl<P: HostProbe> Sampler<P> {
    pub fn new(
        probe: P,
        gpus: Vec<Box<dyn GpuBackend>>,
        root_pid: u32,
        metrics: MetricSelection,
    ) -> Self {
        Self {
            probe,
            gpus,
            network: NetworkCounter::default(),
            root_pid,
            metrics,
        }
    }

    pub fn has_gpus(&self) -> bool {
        !self.gpus.is_empty()
    }

    /// Refresh the probe once and read every enabled metric.
    pub fn sample(&mut self, tracked: &[ProcessIdentity]) -> Reading {
        let _span = tracing::trace_span!("sampler.sample").entered();
        self.probe.refresh();

        let mut reading = Reading {
            cpu_percent: self.metrics.cpu.then(|| self.sample_cpu()).flatten(),
            memory_percent: self.metrics.memory.then(|| self.sample_memory()).flatten(),
            ..Reading::default()
        };
        if self.metrics.network {
            reading.network = self.sample_network();
        }
        if self.metrics.gpu {
            reading.gpus = self.sample_gpu();
        }
        if self.metrics.processes {
            reading.discovered = self.probe.children_of(self.root_pid);
            let identities = tracked
                .iter()
                .chain(reading.discovered.iter().map(|entry| &entry.identity));
            let mut processes = HashMap::new();
            for identity in identities {
                processes
                    .entry(*identity)
                    .or_insert_with(|| self.sample_process(identity));
            }
            reading.processes = processes;
        }
        reading
    }

    pub fn sample_cpu(&self) -> Option<f64> {
        match self.probe.cpu_percent() {
            Ok(value) => clamp_percent(value),
            Err(err) => {
                debug!(error = %err, "system cpu unavailable");
                None
            }
        }
    }

    pub fn sample_memory(&self) -> Option<f64> {
        match self.probe.memory_percent() {
            Ok(value) => clamp_percent(value),
            Err(err) => {
                debug!(error = %err, "system memory unavailable");
                None
            }
        }
    }

    pub fn sample_network(&mut self) -> Option<NetworkDelta> {
        match self.probe.network_totals() {
            Ok(totals) => Some(self.network.delta(totals)),
            Err(err) => {
                debug!(error = %err, "network counters unavailable");
                None
            }
        }
    }

    /// Re-enumerate every backend and read each device's load.
    pub fn sample_gpu(&mut self) -> Vec<(String, Option<f64>)> {
        let mut loads = Vec::new();
        for backend in &mut self.gpus {
            let handles = match backend.enumerate() {
                Ok(handles) => handles,
                Err(err) => {
                    debug!(vendor = %backend.vendor(), error = %err, "GPU enumeration failed");
                    continue;
                }
            };
            for handle in handles {
                let load = match backend.load(&handle) {
                    Ok(value) => clamp_percent(value),
                    Err(err) => {
                        debug!(gpu = %handle.key(), error = %err, "GPU load unavailable");
                        None
                    }
                };
                loads.push((handle.key(), load));
            }
        }
        loads
    }

    pub fn sample_process(&self, identity: &ProcessIdentity) -> ProcessUsage {
        match self.probe.process_usage(identity) {
            Ok(raw) => ProcessUsage {
                cpu_percent: clamp_percent(raw.cpu_percent),
                memory_percent: clamp_percent(raw.memory_percent),
            },
            Err(Error::ProcessVanished { pid }) => {
                trace!(pid, "tracked process no longer running");
                ProcessUsage::default()
            }
            Err(err) => {
                debug!(pid = identity.pid, error = %err, "process usage unavailable");
                ProcessUsage::default()
            }
        }
    }
}
