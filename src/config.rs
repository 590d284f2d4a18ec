//! Agent settings. The defaults are the agent's fixed behavior; the command
//! line can override them.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Pause between collection passes
pub const SLEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Port of the /metrics endpoint
pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

pub const DEFAULT_PROCFS: &str = "/proc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen: SocketAddr,
    pub interval: Duration,
    pub procfs: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(DEFAULT_BIND, DEFAULT_PORT),
            interval: SLEEP_INTERVAL,
            procfs: PathBuf::from(DEFAULT_PROCFS),
        }
    }
}
