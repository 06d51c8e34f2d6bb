//! One request/response cycle against the NIS.
//!
//! ## Example
//!
//! ```rust,no_run
//! use upswatch_nis::NisClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NisClient::builder()
//!         .host("10.0.0.12")
//!         .connect_timeout(Duration::from_secs(2))
//!         .build();
//!
//!     let record = client.fetch_snapshot().await?;
//!     println!("status: {:?}", record.ups.status);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use upswatch_types::StatusRecord;

use crate::{decode, FetchError, Session};

/// The only command this client issues.
pub const STATUS_COMMAND: &str = "status";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3551;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one NIS endpoint.
///
/// Holds only addressing and deadlines. Every fetch opens a fresh session.
#[derive(Debug, Clone)]
pub struct NisClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
}

impl NisClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> NisClientBuilder {
        NisClientBuilder::default()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    /// Fetch and decode one status report.
    ///
    /// The session is closed before decoding, and on every failure path.
    pub async fn fetch_snapshot(&self) -> Result<StatusRecord, FetchError> {
        let mut session = Session::new(&self.host, self.port).with_io_timeout(self.io_timeout);
        session
            .open(self.connect_timeout)
            .await
            .map_err(FetchError::Connect)?;

        let exchanged = exchange(&mut session).await;
        session.close().await;
        let body = exchanged?;

        let record = decode(&body).map_err(FetchError::Decode)?;
        tracing::debug!(addr = %session.addr(), bytes = body.len(), "decoded status report");
        Ok(record)
    }
}

async fn exchange(session: &mut Session) -> Result<String, FetchError> {
    session.send(STATUS_COMMAND).await.map_err(FetchError::Send)?;
    session.receive().await.map_err(FetchError::Receive)
}

/// Builder for [`NisClient`].
#[derive(Debug)]
pub struct NisClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
}

impl Default for NisClientBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            connect_timeout: None,
            io_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }
}

impl NisClientBuilder {
    /// Set the NIS host (default: "127.0.0.1").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the NIS port (default: 3551).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the connect deadline (default: 5 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the deadline for each send and receive (default: 10 seconds).
    ///
    /// `None` lets a silent server stall the fetch indefinitely.
    pub fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> NisClient {
        NisClient {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            io_timeout: self.io_timeout,
        }
    }
}

/// Fetch one snapshot from `host:port` with the default I/O deadline.
pub async fn fetch_snapshot(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<StatusRecord, FetchError> {
    NisClient::builder()
        .host(host)
        .port(port)
        .connect_timeout(connect_timeout)
        .build()
        .fetch_snapshot()
        .await
}
