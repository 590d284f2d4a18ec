//! CPU utilization and context switches from /proc/stat.

use super::Sampler;
use crate::registry::Metric;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Raw CPU time values from the aggregate `cpu` line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }

    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }
}

/// CPU busy percentage, computed from the delta since the previous sample.
///
/// The first sample is measured against boot, so it reports the average
/// utilization since the machine started.
pub struct CpuCollector {
    stat_path: PathBuf,
    prev: CpuTimes,
}

impl CpuCollector {
    pub fn new(procfs: &Path) -> Self {
        Self {
            stat_path: procfs.join("stat"),
            prev: CpuTimes::default(),
        }
    }

    /// Collect current CPU utilization
    pub fn collect(&mut self) -> Result<f64> {
        let content = fs::read_to_string(&self.stat_path)
            .with_context(|| format!("Failed to read {}", self.stat_path.display()))?;
        let times = parse_cpu_times(&content)?;

        let utilization = calculate_utilization(&self.prev, &times);
        self.prev = times;
        Ok(utilization)
    }
}

impl Sampler for CpuCollector {
    fn metric(&self) -> Metric {
        Metric::CpuUsage
    }

    fn sample(&mut self) -> Result<f64> {
        self.collect()
    }
}

/// Cumulative context switches since boot.
pub struct ContextSwitchSampler {
    stat_path: PathBuf,
}

impl ContextSwitchSampler {
    pub fn new(procfs: &Path) -> Self {
        Self {
            stat_path: procfs.join("stat"),
        }
    }
}

impl Sampler for ContextSwitchSampler {
    fn metric(&self) -> Metric {
        Metric::ContextSwitches
    }

    fn sample(&mut self) -> Result<f64> {
        let content = fs::read_to_string(&self.stat_path)
            .with_context(|| format!("Failed to read {}", self.stat_path.display()))?;
        Ok(parse_context_switches(&content)? as f64)
    }
}

/// Parse the aggregate `cpu` line of /proc/stat
pub fn parse_cpu_times(stat: &str) -> Result<CpuTimes> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .context("No aggregate cpu line in stat")?;

    let parts: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|s| s.parse().ok())
        .collect();

    if parts.len() < 4 {
        anyhow::bail!("Truncated cpu line: {line}");
    }

    let field = |i: usize| parts.get(i).copied().unwrap_or(0);
    Ok(CpuTimes {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// Parse the `ctxt` counter of /proc/stat
pub fn parse_context_switches(stat: &str) -> Result<u64> {
    stat.lines()
        .find_map(|line| line.strip_prefix("ctxt "))
        .context("No ctxt line in stat")?
        .trim()
        .parse()
        .context("Invalid ctxt value")
}

fn calculate_utilization(prev: &CpuTimes, curr: &CpuTimes) -> f64 {
    let total_delta = curr.total().saturating_sub(prev.total());
    if total_delta == 0 {
        return 0.0;
    }

    let idle_delta = curr.idle_total().saturating_sub(prev.idle_total());
    100.0 * total_delta.saturating_sub(idle_delta) as f64 / total_delta as f64
}
