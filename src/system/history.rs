use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cpu,
    Gpu,
    Memory,
    Network,
}

impl Category {
    /// Chart order on the dashboard.
    pub const ALL: [Category; 4] = [
        Category::Cpu,
        Category::Gpu,
        Category::Memory,
        Category::Network,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Gpu => "gpu",
            Category::Memory => "memory",
            Category::Network => "network",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub category: Category,
    pub source: String,
}

impl SeriesKey {
    pub fn new(category: Category, source: impl Into<String>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.source)
    }
}

/// Bounded ring of optional samples, oldest first.
#[derive(Clone, Debug)]
pub struct Series {
    samples: VecDeque<Option<f64>>,
    capacity: usize,
}

impl Series {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Overwrite the newest sample, or push when empty.
    pub fn replace_last(&mut self, value: Option<f64>) {
        match self.samples.back_mut() {
            Some(last) => *last = value,
            None => self.push(value),
        }
    }

    /// Pad with gaps until the series holds `len` samples.
    pub fn pad_to(&mut self, len: usize) {
        while self.samples.len() < len.min(self.capacity) {
            self.push(None);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<Option<f64>> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Option<f64>> {
        self.samples.iter().copied().collect()
    }

    #[cfg(test)]
    pub(crate) fn truncate_front(&mut self, n: usize) {
        self.samples.drain(..n.min(self.samples.len()));
    }
}
