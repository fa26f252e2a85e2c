use std::collections::HashMap;

/// Identifies one OS process across pid reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessIdentity {
    pub pid: u32,
    /// Start time in seconds since the Unix epoch, as reported by the OS.
    pub start_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessEntry {
    pub identity: ProcessIdentity,
    pub name: String,
}

/// CPU and resident-memory share of one process, already clamped to `[0, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProcessUsage {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct TrackedProcess {
    pub identity: ProcessIdentity,
    pub display_name: String,
}

/// The root process plus every child ever observed, in registration order.
///
/// Entries are never removed; a process that exits keeps its display name and
/// reports empty samples from then on. Display names never repeat and never
/// equal one of the reserved source names.
#[derive(Clone, Debug)]
pub struct ProcessRegistry {
    processes: Vec<TrackedProcess>,
    by_identity: HashMap<ProcessIdentity, usize>,
    reserved: Vec<String>,
}

impl ProcessRegistry {
    /// `reserved` lists source names already used by non-process series in
    /// the same charts.
    pub fn new(root: ProcessIdentity, root_name: &str, reserved: &[&str]) -> Self {
        let mut registry = ProcessRegistry {
            processes: Vec::new(),
            by_identity: HashMap::new(),
            reserved: reserved.iter().map(|name| name.to_string()).collect(),
        };
        registry.register(root, root_name);
        registry
    }

    fn is_taken(&self, name: &str) -> bool {
        self.reserved.iter().any(|r| r == name)
            || self.processes.iter().any(|p| p.display_name == name)
    }

    /// Register `identity` unless it is already tracked. Returns the display
    /// name of a newly registered process.
    pub fn register(&mut self, identity: ProcessIdentity, name: &str) -> Option<&str> {
        if self.by_identity.contains_key(&identity) {
            return None;
        }
        let mut display_name = name.to_string();
        if self.is_taken(&display_name) {
            display_name = format!("{name} ({})", identity.pid);
        }
        if self.is_taken(&display_name) {
            display_name = format!("{name} ({}:{})", identity.pid, identity.start_time);
        }
        self.by_identity.insert(identity, self.processes.len());
        self.processes.push(TrackedProcess {
            identity,
            display_name,
        });
        self.processes.last().map(|p| p.display_name.as_str())
    }

    pub fn display_name(&self, identity: &ProcessIdentity) -> Option<&str> {
        self.by_identity
            .get(identity)
            .map(|&idx| self.processes[idx].display_name.as_str())
    }

    pub fn identities(&self) -> Vec<ProcessIdentity> {
        self.processes.iter().map(|p| p.identity).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedProcess> {
        self.processes.iter()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
