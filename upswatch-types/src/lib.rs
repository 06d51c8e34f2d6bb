//! # upswatch-types
//!
//! Typed representation of the status report served by the apcupsd Network
//! Information Server (NIS). The decoder in `upswatch-nis` produces a
//! [`StatusRecord`]; the exporter turns it into gauges.
//!
//! ## Design Goals
//!
//! - **Absent is not zero**: every measurement is an `Option`, so a key the
//!   daemon never reported stays distinguishable from a reported `0`
//! - **Sentinels are explicit**: `N/A` dates become [`Timestamp::Unknown`] and
//!   a silenced alarm becomes [`AlarmInterval::Disabled`]
//! - **Open status set**: vendors add status words, so [`UpsStatus`] keeps
//!   anything it does not recognise verbatim
//! - **Optional serialization**: enable the `serde` feature for JSON output
//!
//! ## Example
//!
//! ```rust
//! use upswatch_types::{StatusRecord, UpsStatus};
//!
//! let mut record = StatusRecord::default();
//! record.ups.status = Some(UpsStatus::from("ONBATT"));
//! record.ups.battery.charge_percent = Some(87.0);
//!
//! assert_eq!(record.ups.status.as_ref().map(UpsStatus::metric_value), Some(2.0));
//! assert!(record.ups.line_voltage.is_none());
//! ```

mod record;
mod status;
mod values;

pub use record::*;
pub use status::*;
pub use values::*;
