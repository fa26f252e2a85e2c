use sysinfo::{Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::process::{ProcessEntry, ProcessIdentity};
use crate::error::{Error, Result};

/// Cumulative byte counters summed over every network interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkTotals {
    pub received_bytes: u64,
    pub sent_bytes: u64,
}

/// Unclamped per-process usage as reported by the OS.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawProcessUsage {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// OS access used by the sampler. Readers return the values captured by the
/// most recent [`HostProbe::refresh`].
pub trait HostProbe: Send {
    fn refresh(&mut self);

    fn cpu_percent(&self) -> Result<f64>;

    fn memory_percent(&self) -> Result<f64>;

    fn network_totals(&self) -> Result<NetworkTotals>;

    /// Fails with [`Error::ProcessVanished`] once `identity` no longer runs.
    fn process_usage(&self, identity: &ProcessIdentity) -> Result<RawProcessUsage>;

    /// Direct children of `pid`; grandchildren are not included.
    fn children_of(&self, pid: u32) -> Vec<ProcessEntry>;
}

pub struct Collector {
    sys: System,
    networks: Networks,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        Collector {
            sys,
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// The application's own process.
    pub fn current_process(&self) -> Result<ProcessEntry> {
        let pid = sysinfo::get_current_pid().map_err(|e| Error::MetricUnavailable(e.to_string()))?;
        let process = self
            .sys
            .process(pid)
            .ok_or(Error::ProcessVanished { pid: pid.as_u32() })?;
        Ok(ProcessEntry {
            identity: ProcessIdentity {
                pid: pid.as_u32(),
                start_time: process.start_time(),
            },
            name: process.name().to_string_lossy().to_string(),
        })
    }

    /// The application's own process, named after the product rather than the
    /// executable.
    pub fn root_process(&self) -> Result<ProcessEntry> {
        let mut entry = self.current_process()?;
        entry.name = crate::PRODUCT_NAME.to_string();
        Ok(entry)
    }

    /// CPU model name of the first core, if the OS reports one.
    pub fn cpu_brand(&self) -> Option<String> {
        self.sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
    }
}

impl HostProbe for Collector {
    fn refresh(&mut self) {
        let _span = tracing::trace_span!("collector.refresh").entered();

        self.sys.refresh_memory();
        self.sys.refresh_cpu_usage();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        self.networks.refresh(true);
    }

    fn cpu_percent(&self) -> Result<f64> {
        Ok(f64::from(self.sys.global_cpu_usage()))
    }

    fn memory_percent(&self) -> Result<f64> {
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(Error::MetricUnavailable(
                "total memory reported as zero".to_string(),
            ));
        }
        let used = total.saturating_sub(self.sys.available_memory());
        Ok(used as f64 / total as f64 * 100.0)
    }

    fn network_totals(&self) -> Result<NetworkTotals> {
        let totals = self
            .networks
            .list()
            .values()
            .fold(NetworkTotals::default(), |acc, data| NetworkTotals {
                received_bytes: acc.received_bytes.saturating_add(data.total_received()),
                sent_bytes: acc.sent_bytes.saturating_add(data.total_transmitted()),
            });
        Ok(totals)
    }

    fn process_usage(&self, identity: &ProcessIdentity) -> Result<RawProcessUsage> {
        let vanished = Error::ProcessVanished { pid: identity.pid };
        let Some(process) = self.sys.process(Pid::from_u32(identity.pid)) else {
            return Err(vanished);
        };
        if process.start_time() != identity.start_time {
            return Err(vanished);
        }
        let total = self.sys.total_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            process.memory() as f64 / total as f64 * 100.0
        };
        Ok(RawProcessUsage {
            cpu_percent: f64::from(process.cpu_usage()),
            memory_percent,
        })
    }

    fn children_of(&self, pid: u32) -> Vec<ProcessEntry> {
        let parent = Pid::from_u32(pid);
        let mut children: Vec<ProcessEntry> = self
            .sys
            .processes()
            .iter()
            // Threads show up as processes on Linux; only real children count.
            .filter(|(_, process)| process.parent() == Some(parent) && process.thread_kind().is_none())
            .map(|(child_pid, process)| ProcessEntry {
                identity: ProcessIdentity {
                    pid: child_pid.as_u32(),
                    start_time: process.start_time(),
                },
                name: process.name().to_string_lossy().to_string(),
            })
            .collect();
        children.sort_by_key(|entry| entry.identity);
        children
    }
}
