//! perfgauge - host resource metrics agent.
//!
//! A collector loop samples CPU, memory, disk I/O, network I/O, process count
//! and context switches from procfs into a fixed registry of gauges, while an
//! HTTP server renders the latest values for pull-based scrapers.

pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod metrics;
pub mod process;
pub mod registry;

pub use collector::Collector;
pub use config::Config;
pub use error::{Error, UnknownMetric};
pub use exposition::ExpositionServer;
pub use metrics::{Sampler, SAMPLE_FAILED};
pub use registry::{Metric, Registry};
