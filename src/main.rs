//! perfgauge - samples host resource metrics and serves them on /metrics.

use clap::Parser;
use perfgauge::config::{self, Config};
use perfgauge::{exposition, Collector, Error, ExpositionServer, Registry};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

/// Host metrics agent for pull-based monitoring
#[derive(Parser, Debug)]
#[command(name = "perfgauge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the /metrics endpoint
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Address to bind the /metrics endpoint on
    #[arg(short, long, default_value_t = config::DEFAULT_BIND)]
    bind: IpAddr,

    /// Seconds to sleep between collection passes
    #[arg(short, long, default_value = "1", value_parser = parse_interval)]
    interval: Duration,

    /// Root of the proc filesystem to sample
    #[arg(long, default_value = config::DEFAULT_PROCFS)]
    procfs: PathBuf,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            listen: SocketAddr::new(self.bind, self.port),
            interval: self.interval,
            procfs: self.procfs,
        }
    }
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(format!("interval must be a positive number of seconds, got '{s}'")),
    }
}

/// Create the gauges and start the exposition server.
fn start(config: &Config) -> Result<(Arc<Registry>, ExpositionServer), Error> {
    let registry = Arc::new(Registry::new()?);
    let server = exposition::spawn(Arc::clone(&registry), config.listen)?;
    Ok((registry, server))
}

fn main() -> ExitCode {
    let config = Args::parse().into_config();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let (registry, server) = match start(&config) {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %server.local_addr(), procfs = %config.procfs.display(), "perfgauge started");

    Collector::with_host_samplers(registry, config.interval, &config.procfs).run()
}
