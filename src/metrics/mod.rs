//! Host metric samplers reading Linux procfs.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;

pub use cpu::{ContextSwitchSampler, CpuCollector};
pub use disk::{DiskCollector, DiskDirection};
pub use memory::MemoryCollector;
pub use network::{NetworkCollector, NetworkDirection};

use crate::process::ProcessCountSampler;
use crate::registry::Metric;
use anyhow::Result;
use std::path::Path;

/// Value written to a gauge when its sampler fails.
///
/// Not distinguished from a real reading in the registry; failures are only
/// visible in the agent's log.
pub const SAMPLE_FAILED: f64 = -1.0;

/// Reads one OS counter for one metric.
pub trait Sampler: Send {
    /// The gauge this sampler feeds
    fn metric(&self) -> Metric;

    /// Take a reading
    fn sample(&mut self) -> Result<f64>;
}

/// The eight host samplers, in collection order.
pub fn host_samplers(procfs: &Path) -> Vec<Box<dyn Sampler>> {
    vec![
        Box::new(CpuCollector::new(procfs)),
        Box::new(MemoryCollector::new(procfs)),
        Box::new(DiskCollector::new(procfs, DiskDirection::Read)),
        Box::new(DiskCollector::new(procfs, DiskDirection::Write)),
        Box::new(NetworkCollector::new(procfs, NetworkDirection::Rx)),
        Box::new(NetworkCollector::new(procfs, NetworkDirection::Tx)),
        Box::new(ProcessCountSampler::new(procfs)),
        Box::new(ContextSwitchSampler::new(procfs)),
    ]
}
