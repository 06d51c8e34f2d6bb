//! Error types for the exporter.

use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

/// Errors that can occur while starting the metrics endpoint.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// The configured listen address is not `host:port`.
    #[error("invalid listen address {addr:?}: {source}")]
    InvalidListenAddr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
