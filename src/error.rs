//! Error types for agent startup and metric lookup.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Failures that stop the agent before the collector loop starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to build exposition runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to spawn exposition server thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to create metric gauges: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// A metric name outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}'")]
pub struct UnknownMetric(pub String);
