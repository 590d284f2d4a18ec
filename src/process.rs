//! Process count from the /proc/[pid] directories.

use crate::metrics::Sampler;
use crate::registry::Metric;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Counts the processes currently visible in procfs.
pub struct ProcessCountSampler {
    proc_dir: PathBuf,
}

impl ProcessCountSampler {
    pub fn new(procfs: &Path) -> Self {
        Self {
            proc_dir: procfs.to_path_buf(),
        }
    }
}

impl Sampler for ProcessCountSampler {
    fn metric(&self) -> Metric {
        Metric::ProcessCount
    }

    fn sample(&mut self) -> Result<f64> {
        Ok(count_processes(&self.proc_dir)? as f64)
    }
}

/// Count numeric entries (PIDs) in a procfs directory
pub fn count_processes(proc_dir: &Path) -> Result<u64> {
    let entries = fs::read_dir(proc_dir)
        .with_context(|| format!("Failed to list {}", proc_dir.display()))?;

    let mut count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
            // A process can exit between listing and stat; skip it
            if filename.parse::<u32>().is_ok() && path.is_dir() {
                count += 1;
            }
        }
    }

    Ok(count)
}
