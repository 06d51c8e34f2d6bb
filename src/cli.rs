//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::Overrides;

// Flags left unset fall through to the settings file, then the environment,
// then the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "upswatch", version)]
#[command(about = "Export UPS status from the apcupsd Network Information Server as Prometheus gauges")]
pub struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// NIS host [default: 127.0.0.1]
    #[arg(long, value_name = "HOST")]
    pub nis_address: Option<String>,

    /// NIS port [default: 3551]
    #[arg(long, value_name = "PORT")]
    pub nis_port: Option<u16>,

    /// Connect deadline in milliseconds [default: 5000]
    #[arg(long, value_name = "MS")]
    pub connect_timeout: Option<u64>,

    /// Deadline for each send and receive in milliseconds, 0 for none [default: 10000]
    #[arg(long, value_name = "MS")]
    pub io_timeout: Option<u64>,

    /// Address to serve metrics on [default: 127.0.0.1]
    #[arg(long, value_name = "HOST")]
    pub metrics_address: Option<String>,

    /// Port to serve metrics on [default: 5000]
    #[arg(long, value_name = "PORT")]
    pub metrics_port: Option<u16>,

    /// Path to serve metrics on [default: /metrics]
    #[arg(long, value_name = "PATH")]
    pub metrics_path: Option<String>,

    /// Seconds between collections [default: 15]
    #[arg(long, value_name = "SECONDS")]
    pub metrics_interval: Option<u64>,

    /// Prefix for every gauge name [default: ups]
    #[arg(long)]
    pub namespace: Option<String>,

    /// Default log level; RUST_LOG refines it [default: info]
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Fetch one status record, print it as JSON and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// The settings layer these flags contribute.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            nis_address: self.nis_address.clone(),
            nis_port: self.nis_port,
            connect_timeout_ms: self.connect_timeout,
            io_timeout_ms: self.io_timeout,
            metrics_address: self.metrics_address.clone(),
            metrics_port: self.metrics_port,
            metrics_path: self.metrics_path.clone(),
            metrics_interval_secs: self.metrics_interval,
            namespace: self.namespace.clone(),
            log_level: self.log_level.clone(),
        }
    }
}
