//! Memory usage from /proc/meminfo.

use super::Sampler;
use crate::registry::Metric;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The meminfo fields the usage percentage needs, in bytes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub total: u64,
    pub available: u64,
}

impl MemInfo {
    /// Used memory percentage
    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let used = self.total.saturating_sub(self.available);
        100.0 * used as f64 / self.total as f64
    }
}

/// Memory metrics collector
pub struct MemoryCollector {
    meminfo_path: PathBuf,
}

impl MemoryCollector {
    pub fn new(procfs: &Path) -> Self {
        Self {
            meminfo_path: procfs.join("meminfo"),
        }
    }

    /// Collect current memory usage percentage
    pub fn collect(&self) -> Result<f64> {
        let meminfo = fs::read_to_string(&self.meminfo_path)
            .with_context(|| format!("Failed to read {}", self.meminfo_path.display()))?;
        Ok(parse_meminfo(&meminfo)?.used_percent())
    }
}

impl Sampler for MemoryCollector {
    fn metric(&self) -> Metric {
        Metric::MemoryUsage
    }

    fn sample(&mut self) -> Result<f64> {
        self.collect()
    }
}

pub fn parse_meminfo(meminfo: &str) -> Result<MemInfo> {
    let mut total: Option<u64> = None;
    let mut available: Option<u64> = None;
    let mut free: u64 = 0;
    let mut buffers: u64 = 0;
    let mut cached: u64 = 0;

    for line in meminfo.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let value = parts[1].parse::<u64>().unwrap_or(0).saturating_mul(1024); // kB to bytes

        match parts[0] {
            "MemTotal:" => total = Some(value),
            "MemAvailable:" => available = Some(value),
            "MemFree:" => free = value,
            "Buffers:" => buffers = value,
            "Cached:" => cached = value,
            _ => {}
        }
    }

    let total = total.filter(|t| *t > 0).context("No MemTotal in meminfo")?;

    // Kernels before 3.14 have no MemAvailable
    let available = available.unwrap_or_else(|| free.saturating_add(buffers).saturating_add(cached));

    Ok(MemInfo { total, available })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_percent_from_available() {
        let info = parse_meminfo(
            "MemTotal:       16000000 kB\n\
             MemFree:         1000000 kB\n\
             MemAvailable:    4000000 kB\n\
             Buffers:          200000 kB\n\
             Cached:          2000000 kB\n",
        )
        .unwrap();

        assert_eq!(info.total, 16_000_000 * 1024);
        assert_eq!(info.available, 4_000_000 * 1024);
        assert_eq!(info.used_percent(), 75.0);
    }

    #[test]
    fn falls_back_to_free_buffers_cached() {
        let info = parse_meminfo(
            "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 350 kB\n",
        )
        .unwrap();
        assert_eq!(info.used_percent(), 50.0);
    }

    #[test]
    fn oversized_fields_saturate() {
        let info = parse_meminfo("MemTotal: 18446744073709551615 kB\n").unwrap();
        assert_eq!(info.total, u64::MAX);

        let info = parse_meminfo(
            "MemTotal: 18446744073709551615 kB\n\
             MemFree: 18446744073709551615 kB\n\
             Buffers: 18446744073709551615 kB\n",
        )
        .unwrap();
        assert_eq!(info.available, u64::MAX);
        assert_eq!(info.used_percent(), 0.0);
    }

    #[test]
    fn missing_total_is_an_error() {
        assert!(parse_meminfo("MemFree: 100 kB\n").is_err());
        assert!(parse_meminfo("MemTotal: 0 kB\n").is_err());
    }
}
