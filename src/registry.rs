//! Fixed set of gauges shared between the collector and the exposition server.
//!
//! Each metric is a `prometheus::Gauge`, an atomic f64, so a reader never
//! observes a torn value. There is no lock across metrics: a scrape can see
//! some gauges from the current cycle and others from the previous one.

use crate::error::UnknownMetric;
use prometheus::{Gauge, Opts};
use std::fmt::{self, Write};
use std::str::FromStr;

/// The metrics exported by the agent, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    CpuUsage,
    MemoryUsage,
    DiskIoRead,
    DiskIoWrite,
    NetworkRx,
    NetworkTx,
    ProcessCount,
    ContextSwitches,
}

/// Number of exported metrics.
pub const METRIC_COUNT: usize = 8;

impl Metric {
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::CpuUsage,
        Metric::MemoryUsage,
        Metric::DiskIoRead,
        Metric::DiskIoWrite,
        Metric::NetworkRx,
        Metric::NetworkTx,
        Metric::ProcessCount,
        Metric::ContextSwitches,
    ];

    /// Name as it appears on the wire
    pub fn name(self) -> &'static str {
        match self {
            Metric::CpuUsage => "cpu_usage",
            Metric::MemoryUsage => "memory_usage",
            Metric::DiskIoRead => "disk_io_read",
            Metric::DiskIoWrite => "disk_io_write",
            Metric::NetworkRx => "network_rx",
            Metric::NetworkTx => "network_tx",
            Metric::ProcessCount => "process_count",
            Metric::ContextSwitches => "context_switches",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Metric::CpuUsage => "CPU busy percentage over the last interval",
            Metric::MemoryUsage => "Memory used percentage",
            Metric::DiskIoRead => "Bytes read from whole disks since boot",
            Metric::DiskIoWrite => "Bytes written to whole disks since boot",
            Metric::NetworkRx => "Bytes received on non-loopback interfaces since boot",
            Metric::NetworkTx => "Bytes transmitted on non-loopback interfaces since boot",
            Metric::ProcessCount => "Number of processes",
            Metric::ContextSwitches => "Context switches since boot",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Latest value of every metric. Construct once, share through an `Arc`.
pub struct Registry {
    gauges: [Gauge; METRIC_COUNT],
}

impl Registry {
    /// Create all gauges, each starting at zero.
    pub fn new() -> Result<Self, prometheus::Error> {
        let mut gauges = Vec::with_capacity(METRIC_COUNT);
        for metric in Metric::ALL {
            gauges.push(Gauge::with_opts(Opts::new(metric.name(), metric.help()))?);
        }

        let gauges: [Gauge; METRIC_COUNT] = gauges
            .try_into()
            .map_err(|_| prometheus::Error::Msg("gauge count mismatch".to_string()))?;
        Ok(Self { gauges })
    }

    /// Overwrite the current value of `metric`.
    pub fn set(&self, metric: Metric, value: f64) {
        self.gauges[metric.index()].set(value);
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.gauges[metric.index()].get()
    }

    /// Render every metric as `<name> <value>`, one per line.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(32 * METRIC_COUNT);
        for metric in Metric::ALL {
            let _ = writeln!(out, "{} {}", metric.name(), format_value(self.get(metric)));
        }
        out
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { '+' } else { '-' };
        format!("{sign}Inf")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn parse_lines(body: &str) -> Vec<(Metric, f64)> {
        body.lines()
            .map(|line| {
                let (name, value) = line.split_once(' ').expect("name/value pair");
                (name.parse().unwrap(), value.parse().unwrap())
            })
            .collect()
    }

    #[test]
    fn each_gauge_is_described_by_its_metric() {
        let registry = Registry::new().unwrap();
        for metric in Metric::ALL {
            let desc = registry.gauges[metric.index()].desc();
            assert_eq!(desc.len(), 1);
            assert_eq!(desc[0].fq_name, metric.name());
            assert_eq!(desc[0].help, metric.help());
        }
    }

    #[test]
    fn fresh_registry_renders_all_metrics_at_zero() {
        let registry = Registry::new().unwrap();
        let lines = parse_lines(&registry.render());

        assert_eq!(lines.len(), 8);
        for ((metric, value), expected) in lines.iter().zip(Metric::ALL) {
            assert_eq!(*metric, expected);
            assert_eq!(*value, 0.0);
        }
    }

    #[test]
    fn set_overwrites_only_the_named_metric() {
        let registry = Registry::new().unwrap();
        registry.set(Metric::NetworkTx, 1234.5);
        registry.set(Metric::NetworkTx, 99.25);

        assert_eq!(registry.get(Metric::NetworkTx), 99.25);
        assert_eq!(registry.get(Metric::NetworkRx), 0.0);
        assert!(registry.render().contains("network_tx 99.25\n"));
    }

    #[test]
    fn render_is_idempotent_without_writes() {
        let registry = Registry::new().unwrap();
        registry.set(Metric::CpuUsage, 12.5);
        registry.set(Metric::ContextSwitches, 8_000_000.0);

        assert_eq!(registry.render(), registry.render());
    }

    #[test]
    fn non_finite_values_use_exposition_spelling() {
        let registry = Registry::new().unwrap();
        registry.set(Metric::CpuUsage, f64::NAN);
        registry.set(Metric::DiskIoRead, f64::INFINITY);
        registry.set(Metric::DiskIoWrite, f64::NEG_INFINITY);

        let body = registry.render();
        assert!(body.contains("cpu_usage NaN\n"));
        assert!(body.contains("disk_io_read +Inf\n"));
        assert!(body.contains("disk_io_write -Inf\n"));
    }

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>(), Ok(metric));
        }
        assert_eq!(
            "load_average".parse::<Metric>(),
            Err(UnknownMetric("load_average".to_string()))
        );
    }

    #[test]
    fn concurrent_set_and_render_never_tear_a_value() {
        // Two values with very different bit patterns; any mix would parse to neither.
        const A: f64 = 1.0e-300;
        const B: f64 = -7.5e300;

        let registry = Arc::new(Registry::new().unwrap());
        for metric in Metric::ALL {
            registry.set(metric, A);
        }
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut flip = false;
                while !stop.load(Ordering::Relaxed) {
                    for metric in Metric::ALL {
                        registry.set(metric, if flip { A } else { B });
                    }
                    flip = !flip;
                }
            })
        };

        for _ in 0..2_000 {
            let lines = parse_lines(&registry.render());
            assert_eq!(lines.len(), 8);
            for (_, value) in lines {
                assert!(value == A || value == B, "torn value {value}");
            }
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
