//! # upswatch-exporter
//!
//! Turns UPS status records into gauges and serves them to Prometheus.
//!
//! ## Quick Start
//!
//! ```rust
//! use upswatch_exporter::{GaugeRegistry, Publisher};
//! use upswatch_types::{StatusRecord, UpsStatus};
//!
//! let registry = GaugeRegistry::new();
//! let publisher = Publisher::new("ups");
//! publisher.describe(&registry);
//!
//! let mut record = StatusRecord::new();
//! record.ups.status = Some(UpsStatus::Online);
//! record.ups.battery.charge_percent = Some(100.0);
//! publisher.publish(&record, &registry);
//!
//! assert_eq!(registry.get("ups_status"), Some(1.0));
//! assert!(registry.render().contains("ups_battery_remaining_charge_percent 100"));
//! ```
//!
//! ## Features
//!
//! - **Pluggable sink**: publish into anything implementing [`GaugeSink`]
//! - **Absent stays absent**: fields the UPS did not report are cleared, not zeroed
//! - **HTTP endpoint** (`prometheus` feature, default): metrics and health routes

mod catalogue;
mod error;
mod registry;
mod sink;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use catalogue::{publish, Gauge, Publisher, GAUGES, UP};
pub use error::ExporterError;
pub use registry::GaugeRegistry;
pub use sink::GaugeSink;

// Re-export types for convenience
pub use upswatch_types::StatusRecord;
