use std::collections::HashMap;

use super::process::{ProcessEntry, ProcessIdentity, ProcessUsage};

/// Network throughput since the previous reading, in decimal megabytes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NetworkDelta {
    pub received_mb: f64,
    pub sent_mb: f64,
}

/// Everything the sampler read during one tick.
#[derive(Clone, Debug, Default)]
pub struct Reading {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub network: Option<NetworkDelta>,
    /// GPU key (`"{name}-{id}"`) and load, in enumeration order.
    pub gpus: Vec<(String, Option<f64>)>,
    /// Direct children of the root process seen this tick.
    pub discovered: Vec<ProcessEntry>,
    pub processes: HashMap<ProcessIdentity, ProcessUsage>,
}
