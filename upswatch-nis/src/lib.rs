//! # upswatch-nis
//!
//! Client for the apcupsd Network Information Server (NIS).
//!
//! The NIS answers a `status` command with a plain-text report of
//! `KEY : value` lines, split over length-prefixed frames. This crate speaks
//! that protocol and decodes the report into a typed
//! [`StatusRecord`](upswatch_types::StatusRecord).
//!
//! ## Layers
//!
//! - [`frame`] - `[u16 length][bytes]` framing and response reassembly
//! - [`Session`] - one connection, `Unopened -> Open -> Closed`
//! - [`decode`](mod@decode) - report text to [`StatusRecord`](upswatch_types::StatusRecord)
//! - [`NisClient`] - connect, send `status`, receive, close, decode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let record = upswatch_nis::fetch_snapshot("127.0.0.1", 3551, Duration::from_secs(5)).await?;
//!
//!     if let Some(charge) = record.ups.battery.charge_percent {
//!         println!("battery at {}%", charge);
//!     }
//!     Ok(())
//! }
//! ```

pub mod decode;
pub mod frame;

mod error;
mod fetch;
mod session;

pub use decode::decode;
pub use error::{DecodeError, FetchError, FrameError, SessionError, SessionState, Stage};
pub use fetch::{fetch_snapshot, NisClient, NisClientBuilder, STATUS_COMMAND};
pub use session::Session;

// Re-export types for convenience
pub use upswatch_types::{StatusRecord, Timestamp, UpsStatus};
