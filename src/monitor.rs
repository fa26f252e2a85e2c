use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::error;

use crate::error::Result;
use crate::system::aggregator::SharedAggregator;
use crate::system::collector::HostProbe;
use crate::system::sampler::Sampler;

/// Drives the sampler once per tick and folds each reading into the shared
/// history.
pub struct Monitor<P: HostProbe> {
    sampler: Sampler<P>,
    aggregator: SharedAggregator,
}

impl<P: HostProbe + 'static> Monitor<P> {
    pub fn new(sampler: Sampler<P>, aggregator: SharedAggregator) -> Self {
        Self {
            sampler,
            aggregator,
        }
    }

    /// Sample outside the lock, then hold the write lock only for `record`.
    pub async fn tick(&mut self, now: SystemTime) -> Result<()> {
        let tracked = self.aggregator.read().await.tracked_processes();
        let reading = self.sampler.sample(&tracked);
        self.aggregator.write().await.record(now, reading)
    }

    pub async fn run(mut self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(err) = self.tick(SystemTime::now()).await {
                error!(error = %err, "dashboard tick skipped");
            }
        }
    }

    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(self.run(period))
    }
}
