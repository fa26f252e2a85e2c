pub mod aggregator;
pub mod collector;
pub mod gpu;
pub mod history;
pub mod platform;
pub mod process;
pub mod sampler;
pub mod snapshot;
