use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::debug;

use super::history::{Category, Series, SeriesKey};
use super::process::{ProcessEntry, ProcessIdentity, ProcessRegistry};
use super::snapshot::Reading;
use crate::config::MetricSelection;
use crate::error::{Error, Result};

pub type SharedAggregator = Arc<RwLock<Aggregator>>;

pub const SYSTEM_SOURCE: &str = "system";
pub const RECEIVED_SOURCE: &str = "received";
pub const SENT_SOURCE: &str = "sent";

/// Rolling dashboard history.
///
/// Every series is kept exactly as long as the time axis: a source that
/// appears mid-window is back-filled with gaps, and a known source missing
/// from a reading gets a gap for that tick.
#[derive(Clone, Debug)]
pub struct Aggregator {
    history_length: usize,
    metrics: MetricSelection,
    initialized: bool,
    timestamps: VecDeque<SystemTime>,
    relative_time: Vec<f64>,
    series: Vec<(SeriesKey, Series)>,
    index: HashMap<SeriesKey, usize>,
    registry: ProcessRegistry,
}

impl Aggregator {
    pub fn new(history_length: usize, metrics: MetricSelection, root: ProcessEntry) -> Self {
        let history_length = history_length.max(1);
        Self {
            history_length,
            metrics,
            initialized: false,
            timestamps: VecDeque::with_capacity(history_length),
            relative_time: Vec::with_capacity(history_length),
            series: Vec::new(),
            index: HashMap::new(),
            registry: ProcessRegistry::new(root.identity, &root.name, &[SYSTEM_SOURCE]),
        }
    }

    pub fn into_shared(self) -> SharedAggregator {
        Arc::new(RwLock::new(self))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Fold one tick's reading into the history.
    ///
    /// The first call is a warm-up: it only marks the aggregator initialized so
    /// counters primed by that reading never show up as a spike. Returns
    /// [`Error::InconsistentSeriesLength`] without touching any state when a
    /// series has drifted from the time axis.
    pub fn record(&mut self, now: SystemTime, reading: Reading) -> Result<()> {
        self.verify_lengths()?;

        if !self.initialized {
            self.initialized = true;
            debug!("dashboard history initialized");
            return Ok(());
        }

        if self.timestamps.len() == self.history_length {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);
        // Every known source starts the tick with a gap until it reports.
        for (_, series) in &mut self.series {
            series.push(None);
        }

        if self.metrics.cpu {
            self.append(Category::Cpu, SYSTEM_SOURCE, reading.cpu_percent);
        }
        if self.metrics.memory {
            self.append(Category::Memory, SYSTEM_SOURCE, reading.memory_percent);
        }
        if self.metrics.network {
            let network = reading.network;
            self.append(Category::Network, RECEIVED_SOURCE, network.map(|n| n.received_mb));
            self.append(Category::Network, SENT_SOURCE, network.map(|n| n.sent_mb));
        }
        if self.metrics.gpu {
            for (key, load) in reading.gpus {
                self.append(Category::Gpu, &key, load);
            }
        }
        if self.metrics.processes {
            for entry in &reading.discovered {
                if let Some(name) = self.registry.register(entry.identity, &entry.name) {
                    debug!(pid = entry.identity.pid, name, "tracking child process");
                }
            }
            let tracked: Vec<(ProcessIdentity, String)> = self
                .registry
                .iter()
                .map(|p| (p.identity, p.display_name.clone()))
                .collect();
            for (identity, name) in tracked {
                let usage = reading.processes.get(&identity).copied().unwrap_or_default();
                self.append(Category::Cpu, &name, usage.cpu_percent);
                self.append(Category::Memory, &name, usage.memory_percent);
            }
        }

        self.recompute_relative_time(now);
        Ok(())
    }

    fn append(&mut self, category: Category, source: &str, value: Option<f64>) {
        let key = SeriesKey::new(category, source);
        if let Some(&idx) = self.index.get(&key) {
            self.series[idx].1.replace_last(value);
            return;
        }
        let mut series = Series::new(self.history_length);
        // Gaps for every tick before this one.
        series.pad_to(self.timestamps.len().saturating_sub(1));
        series.push(value);
        self.index.insert(key.clone(), self.series.len());
        self.series.push((key, series));
    }

    fn recompute_relative_time(&mut self, now: SystemTime) {
        self.relative_time.clear();
        self.relative_time.extend(self.timestamps.iter().map(|ts| {
            now.duration_since(*ts)
                .map(|age| age.as_secs_f64())
                .unwrap_or(0.0)
        }));
    }

    pub fn verify_lengths(&self) -> Result<()> {
        let expected = self.timestamps.len();
        for (key, series) in &self.series {
            if series.len() != expected {
                return Err(Error::InconsistentSeriesLength {
                    key: key.to_string(),
                    expected,
                    actual: series.len(),
                });
            }
        }
        Ok(())
    }

    pub fn timestamps(&self) -> impl Iterator<Item = SystemTime> + '_ {
        self.timestamps.iter().copied()
    }

    /// Seconds elapsed since each retained tick, oldest first.
    pub fn relative_time(&self) -> &[f64] {
        &self.relative_time
    }

    pub fn series(&self, key: &SeriesKey) -> Option<&Series> {
        self.index.get(key).map(|&idx| &self.series[idx].1)
    }

    /// Series of one category in the order their sources first appeared.
    pub fn category_series(&self, category: Category) -> impl Iterator<Item = (&str, &Series)> {
        self.series
            .iter()
            .filter(move |(key, _)| key.category == category)
            .map(|(key, series)| (key.source.as_str(), series))
    }

    pub fn all_series(&self) -> impl Iterator<Item = (&SeriesKey, &Series)> {
        self.series.iter().map(|(key, series)| (key, series))
    }

    pub fn has_gpu(&self) -> bool {
        self.series.iter().any(|(key, _)| key.category == Category::Gpu)
    }

    pub fn tracked_processes(&self) -> Vec<ProcessIdentity> {
        self.registry.identities()
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn corrupt_series_for_test(&mut self, key: &SeriesKey) {
        if let Some(&idx) = self.index.get(key) {
            self.series[idx].1.truncate_front(1);
        }
    }
}
