use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use retroarcher::chart::DashboardPayload;
use retroarcher::config::MetricSelection;
use retroarcher::error::{Error, Result};
use retroarcher::locale::Labels;
use retroarcher::system::aggregator::Aggregator;
use retroarcher::system::collector::{HostProbe, NetworkTotals, RawProcessUsage};
use retroarcher::system::gpu::{GpuBackend, GpuHandle, Vendor};
use retroarcher::system::history::{Category, SeriesKey};
use retroarcher::system::process::{ProcessEntry, ProcessIdentity};
use retroarcher::system::sampler::Sampler;

const ROOT_PID: u32 = 4242;

/// Host whose counters follow a fixed script, one step per refresh.
struct ScriptedProbe {
    tick: usize,
    received: Vec<u64>,
    children: HashMap<usize, Vec<ProcessEntry>>,
}

impl ScriptedProbe {
    fn new(received: Vec<u64>) -> Self {
        Self {
            tick: 0,
            received,
            children: HashMap::new(),
        }
    }

    fn current(&self) -> usize {
        self.tick.saturating_sub(1)
    }
}

impl HostProbe for ScriptedProbe {
    fn refresh(&mut self) {
        self.tick += 1;
    }

    fn cpu_percent(&self) -> Result<f64> {
        Ok(10.0 + self.current() as f64)
    }

    fn memory_percent(&self) -> Result<f64> {
        Ok(55.0)
    }

    fn network_totals(&self) -> Result<NetworkTotals> {
        let idx = self.current().min(self.received.len().saturating_sub(1));
        Ok(NetworkTotals {
            received_bytes: self.received.get(idx).copied().unwrap_or(0),
            sent_bytes: 0,
        })
    }

    fn process_usage(&self, identity: &ProcessIdentity) -> Result<RawProcessUsage> {
        if identity.pid == ROOT_PID {
            Ok(RawProcessUsage {
                cpu_percent: 1.0,
                memory_percent: 2.0,
            })
        } else {
            Err(Error::ProcessVanished { pid: identity.pid })
        }
    }

    fn children_of(&self, _pid: u32) -> Vec<ProcessEntry> {
        self.children.get(&self.current()).cloned().unwrap_or_default()
    }
}

/// One GPU that shows up at `appears_at` and fails its load query at
/// `fails_at`. Ticks are counted by enumeration calls.
struct ScriptedGpu {
    tick: usize,
    appears_at: usize,
    fails_at: Option<usize>,
}

impl GpuBackend for ScriptedGpu {
    fn vendor(&self) -> Vendor {
        Vendor::Amd
    }

    fn enumerate(&mut self) -> Result<Vec<GpuHandle>> {
        let tick = self.tick;
        self.tick += 1;
        if tick < self.appears_at {
            return Ok(Vec::new());
        }
        Ok(vec![GpuHandle {
            id: 0,
            name: "Radeon".to_string(),
        }])
    }

    fn load(&mut self, _handle: &GpuHandle) -> Result<f64> {
        let tick = self.tick - 1;
        if Some(tick) == self.fails_at {
            return Err(Error::MetricUnavailable("driver reset".to_string()));
        }
        Ok(20.0 + tick as f64)
    }
}

fn root() -> ProcessEntry {
    ProcessEntry {
        identity: ProcessIdentity {
            pid: ROOT_PID,
            start_time: 7,
        },
        name: "RetroArcher".to_string(),
    }
}

fn at(tick: usize) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + tick as u64)
}

/// Run `ticks` ticks (tick 0 is the warm-up) the way the monitor does.
fn drive(
    sampler: &mut Sampler<ScriptedProbe>,
    aggregator: &mut Aggregator,
    ticks: std::ops::Range<usize>,
) {
    for tick in ticks {
        let reading = sampler.sample(&aggregator.tracked_processes());
        aggregator.record(at(tick), reading).unwrap();
    }
}

#[test]
fn network_deltas_follow_counter_script() {
    let metrics = MetricSelection::default();
    let probe = ScriptedProbe::new(vec![1_000_000, 3_000_000, 3_000_000, 6_000_000]);
    let mut sampler = Sampler::new(probe, Vec::new(), ROOT_PID, metrics);
    let mut aggregator = Aggregator::new(3, metrics, root());

    drive(&mut sampler, &mut aggregator, 0..4);

    let received = aggregator
        .series(&SeriesKey::new(Category::Network, "received"))
        .unwrap();
    assert_eq!(received.to_vec(), vec![Some(2.0), Some(0.0), Some(3.0)]);
    assert_eq!(aggregator.relative_time(), &[2.0, 1.0, 0.0]);
}

#[test]
fn late_gpu_is_back_filled_to_the_time_axis() {
    let metrics = MetricSelection::default();
    let gpu = ScriptedGpu {
        tick: 0,
        appears_at: 5,
        fails_at: None,
    };
    let mut sampler = Sampler::new(
        ScriptedProbe::new(vec![0]),
        vec![Box::new(gpu)],
        ROOT_PID,
        metrics,
    );
    let mut aggregator = Aggregator::new(10, metrics, root());

    drive(&mut sampler, &mut aggregator, 0..5);
    assert!(!aggregator.has_gpu());
    assert!(
        aggregator
            .format(&Labels::default())
            .iter()
            .all(|chart| chart.category != Category::Gpu)
    );

    drive(&mut sampler, &mut aggregator, 5..6);
    let gpu = aggregator
        .series(&SeriesKey::new(Category::Gpu, "Radeon-0"))
        .unwrap();
    assert_eq!(gpu.len(), aggregator.timestamps().count());
    assert_eq!(gpu.to_vec(), vec![None, None, None, None, Some(25.0)]);

    let categories: Vec<Category> = aggregator
        .format(&Labels::default())
        .iter()
        .map(|chart| chart.category)
        .collect();
    assert_eq!(
        categories,
        vec![Category::Cpu, Category::Gpu, Category::Memory, Category::Network]
    );
}

#[test]
fn failing_gpu_query_only_blanks_that_gpu() {
    let metrics = MetricSelection::default();
    let gpu = ScriptedGpu {
        tick: 0,
        appears_at: 0,
        fails_at: Some(10),
    };
    let mut sampler = Sampler::new(
        ScriptedProbe::new(vec![0]),
        vec![Box::new(gpu)],
        ROOT_PID,
        metrics,
    );
    let mut aggregator = Aggregator::new(20, metrics, root());

    drive(&mut sampler, &mut aggregator, 0..11);

    let gpu = aggregator
        .series(&SeriesKey::new(Category::Gpu, "Radeon-0"))
        .unwrap();
    assert_eq!(gpu.last(), Some(None));
    assert_eq!(gpu.iter().filter(Option::is_some).count(), 9);
    for (key, series) in aggregator.all_series() {
        if key.category != Category::Gpu {
            assert!(series.last().flatten().is_some(), "{key} lost its value");
        }
    }
}

#[test]
fn vanished_child_keeps_its_series_with_gaps() {
    let metrics = MetricSelection::default();
    let mut probe = ScriptedProbe::new(vec![0]);
    let child = ProcessEntry {
        identity: ProcessIdentity {
            pid: 9000,
            start_time: 8,
        },
        name: "RetroArcher".to_string(),
    };
    probe.children.insert(2, vec![child]);
    let mut sampler = Sampler::new(probe, Vec::new(), ROOT_PID, metrics);
    let mut aggregator = Aggregator::new(5, metrics, root());

    drive(&mut sampler, &mut aggregator, 0..4);

    let key = SeriesKey::new(Category::Cpu, "RetroArcher (9000)");
    let child = aggregator.series(&key).unwrap();
    assert_eq!(child.to_vec(), vec![None, None, None]);
    assert_eq!(aggregator.registry().len(), 2);
}

#[test]
fn child_named_system_does_not_overwrite_system_totals() {
    let metrics = MetricSelection::default();
    let mut probe = ScriptedProbe::new(vec![0]);
    let child = ProcessEntry {
        identity: ProcessIdentity {
            pid: 9001,
            start_time: 8,
        },
        name: "system".to_string(),
    };
    probe.children.insert(1, vec![child]);
    let mut sampler = Sampler::new(probe, Vec::new(), ROOT_PID, metrics);
    let mut aggregator = Aggregator::new(5, metrics, root());

    drive(&mut sampler, &mut aggregator, 0..3);

    let system = aggregator
        .series(&SeriesKey::new(Category::Cpu, "system"))
        .unwrap();
    assert_eq!(system.to_vec(), vec![Some(11.0), Some(12.0)]);
    let memory = aggregator
        .series(&SeriesKey::new(Category::Memory, "system"))
        .unwrap();
    assert_eq!(memory.to_vec(), vec![Some(55.0), Some(55.0)]);
    let child = aggregator
        .series(&SeriesKey::new(Category::Cpu, "system (9001)"))
        .unwrap();
    assert_eq!(child.to_vec(), vec![None, None]);
}

#[test]
fn format_is_stable_without_a_tick() {
    let metrics = MetricSelection::default();
    let mut sampler = Sampler::new(
        ScriptedProbe::new(vec![0, 1_500_000, 2_000_000]),
        Vec::new(),
        ROOT_PID,
        metrics,
    );
    let mut aggregator = Aggregator::new(5, metrics, root());
    drive(&mut sampler, &mut aggregator, 0..3);

    let labels = Labels::default();
    let first =
        serde_json::to_string(&DashboardPayload::from_charts(&aggregator.format(&labels))).unwrap();
    let second =
        serde_json::to_string(&DashboardPayload::from_charts(&aggregator.format(&labels))).unwrap();
    assert_eq!(first, second);
}
