//! Disk I/O byte counters from /proc/diskstats.

use super::Sampler;
use crate::registry::Metric;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// diskstats always counts 512-byte sectors, whatever the device block size
const SECTOR_SIZE: u64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskDirection {
    Read,
    Write,
}

/// Bytes moved by one whole disk since boot
#[derive(Debug, Clone, PartialEq)]
pub struct DiskBytes {
    pub device: String,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Cumulative bytes read or written across all whole disks.
pub struct DiskCollector {
    diskstats_path: PathBuf,
    direction: DiskDirection,
}

impl DiskCollector {
    pub fn new(procfs: &Path, direction: DiskDirection) -> Self {
        Self {
            diskstats_path: procfs.join("diskstats"),
            direction,
        }
    }

    /// Collect the total for this collector's direction
    pub fn collect(&self) -> Result<u64> {
        let diskstats = fs::read_to_string(&self.diskstats_path)
            .with_context(|| format!("Failed to read {}", self.diskstats_path.display()))?;

        let disks = parse_diskstats(&diskstats);
        Ok(match self.direction {
            DiskDirection::Read => disks.iter().map(|d| d.bytes_read).fold(0, u64::saturating_add),
            DiskDirection::Write => disks.iter().map(|d| d.bytes_written).fold(0, u64::saturating_add),
        })
    }
}

impl Sampler for DiskCollector {
    fn metric(&self) -> Metric {
        match self.direction {
            DiskDirection::Read => Metric::DiskIoRead,
            DiskDirection::Write => Metric::DiskIoWrite,
        }
    }

    fn sample(&mut self) -> Result<f64> {
        Ok(self.collect()? as f64)
    }
}

/// Parse whole-disk byte counters, skipping partitions and virtual devices
pub fn parse_diskstats(diskstats: &str) -> Vec<DiskBytes> {
    let mut disks = Vec::new();

    for line in diskstats.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue;
        }

        let device = parts[2];
        if !is_whole_disk(device) {
            continue;
        }

        let sectors_read: u64 = parts[5].parse().unwrap_or(0);
        let sectors_written: u64 = parts[9].parse().unwrap_or(0);

        disks.push(DiskBytes {
            device: device.to_string(),
            bytes_read: sectors_read.saturating_mul(SECTOR_SIZE),
            bytes_written: sectors_written.saturating_mul(SECTOR_SIZE),
        });
    }

    disks
}

fn is_whole_disk(device: &str) -> bool {
    if device.starts_with("loop") || device.starts_with("ram") || device.starts_with("dm-") {
        return false;
    }

    let ends_with_digit = device.chars().last().is_some_and(|c| c.is_ascii_digit());

    // nvme0n1 is a disk, nvme0n1p1 a partition; sda is a disk, sda1 a partition
    if device.starts_with("nvme") || device.starts_with("mmcblk") {
        !(device.contains('p') && ends_with_digit)
    } else {
        !ends_with_digit
    }
}
