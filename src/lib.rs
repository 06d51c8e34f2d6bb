//! # upswatch
//!
//! Polls the apcupsd Network Information Server (NIS) and republishes the
//! UPS status report as Prometheus gauges.
//!
//! ## Architecture
//!
//! ```text
//!  apcupsd NIS ──frames──▶ upswatch-nis ──StatusRecord──▶ Collector
//!                                                            │
//!                                                            │ set_gauge
//!                                                            ▼
//!  Prometheus ──GET /metrics──▶ PrometheusExporter ──▶ GaugeRegistry
//! ```
//!
//! - **[`settings`]**: defaults, settings file, `UPSWATCH_*` environment and flags
//! - **[`collector`]**: fetches on an interval and publishes each record
//! - **[`logging`]**: `tracing` subscriber with an `EnvFilter`
//! - **[`cli`]**: command-line flags
//!
//! ## Usage
//!
//! ```bash
//! # Serve gauges for the local daemon on :5000/metrics
//! upswatch
//!
//! # Poll another host every 30 seconds
//! upswatch --nis-address 10.0.0.12 --metrics-interval 30
//!
//! # Print one decoded record as JSON
//! upswatch --once
//! ```

pub mod cli;
pub mod collector;
pub mod logging;
pub mod settings;

pub use cli::Cli;
pub use collector::{Collector, CollectorHandle};
pub use settings::{Overrides, Settings, SettingsError};
