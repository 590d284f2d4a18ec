//! The sampling loop that keeps the registry current.

use crate::metrics::{self, Sampler, SAMPLE_FAILED};
use crate::registry::Registry;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Runs every sampler once per interval and writes the results.
pub struct Collector {
    registry: Arc<Registry>,
    samplers: Vec<Box<dyn Sampler>>,
    interval: Duration,
    cycles: u64,
}

impl Collector {
    pub fn new(registry: Arc<Registry>, interval: Duration, samplers: Vec<Box<dyn Sampler>>) -> Self {
        Self {
            registry,
            samplers,
            interval,
            cycles: 0,
        }
    }

    /// Collector over the eight host samplers reading `procfs`
    pub fn with_host_samplers(registry: Arc<Registry>, interval: Duration, procfs: &Path) -> Self {
        Self::new(registry, interval, metrics::host_samplers(procfs))
    }

    /// Number of completed passes
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One pass: sample every metric in order and publish each value.
    ///
    /// A failed read publishes [`SAMPLE_FAILED`]; the pass always completes.
    pub fn run_cycle(&mut self) {
        for sampler in &mut self.samplers {
            let metric = sampler.metric();
            let value = match sampler.sample() {
                Ok(value) => value,
                Err(e) => {
                    let error = format!("{e:#}");
                    tracing::warn!(%metric, %error, "sample failed");
                    SAMPLE_FAILED
                }
            };
            self.registry.set(metric, value);
        }

        self.cycles += 1;
        tracing::debug!(cycle = self.cycles, "collection pass complete");
    }

    /// Sample, sleep, repeat. Never returns.
    pub fn run(mut self) -> ! {
        tracing::info!(
            interval = ?self.interval,
            samplers = self.samplers.len(),
            "collector started"
        );
        loop {
            self.run_cycle();
            thread::sleep(self.interval);
        }
    }
}
