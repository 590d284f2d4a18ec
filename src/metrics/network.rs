//! Network byte counters from /proc/net/dev.

use super::Sampler;
use crate::registry::Metric;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkDirection {
    Rx,
    Tx,
}

/// Per-interface byte totals since boot
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceBytes {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Cumulative bytes received or transmitted across non-loopback interfaces.
pub struct NetworkCollector {
    netdev_path: PathBuf,
    direction: NetworkDirection,
}

impl NetworkCollector {
    pub fn new(procfs: &Path, direction: NetworkDirection) -> Self {
        Self {
            netdev_path: procfs.join("net").join("dev"),
            direction,
        }
    }

    pub fn collect(&self) -> Result<u64> {
        let netdev = fs::read_to_string(&self.netdev_path)
            .with_context(|| format!("Failed to read {}", self.netdev_path.display()))?;

        let interfaces = parse_netdev(&netdev);
        Ok(match self.direction {
            NetworkDirection::Rx => interfaces.iter().map(|i| i.rx_bytes).fold(0, u64::saturating_add),
            NetworkDirection::Tx => interfaces.iter().map(|i| i.tx_bytes).fold(0, u64::saturating_add),
        })
    }
}

impl Sampler for NetworkCollector {
    fn metric(&self) -> Metric {
        match self.direction {
            NetworkDirection::Rx => Metric::NetworkRx,
            NetworkDirection::Tx => Metric::NetworkTx,
        }
    }

    fn sample(&mut self) -> Result<f64> {
        Ok(self.collect()? as f64)
    }
}

/// Parse /proc/net/dev, skipping the two header lines and loopback
pub fn parse_netdev(netdev: &str) -> Vec<InterfaceBytes> {
    let mut interfaces = Vec::new();

    for line in netdev.lines().skip(2) {
        // "eth0:123" has no space after the colon once counters get large
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let interface = name.trim();
        if interface == "lo" {
            continue;
        }

        let parts: Vec<&str> = counters.split_whitespace().collect();
        if parts.len() < 16 {
            continue;
        }

        interfaces.push(InterfaceBytes {
            interface: interface.to_string(),
            rx_bytes: parts[0].parse().unwrap_or(0),
            tx_bytes: parts[8].parse().unwrap_or(0),
        });
    }

    interfaces
}
