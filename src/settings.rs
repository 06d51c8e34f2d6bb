//! Layered settings.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional settings file (`--config`, TOML, YAML or JSON by extension)
//! 3. environment variables prefixed `UPSWATCH_`, with `__` between
//!    sections (`UPSWATCH_NIS__PORT=3552`, `UPSWATCH_LOG_LEVEL=debug`)
//! 4. command-line flags

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use upswatch_exporter::prometheus::PrometheusConfig;
use upswatch_nis::NisClient;

pub const DEFAULT_NIS_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_NIS_PORT: u16 = 3551;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_METRICS_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_METRICS_PORT: u16 = 5000;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_NAMESPACE: &str = "ups";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_PREFIX: &str = "UPSWATCH";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the expected shape.
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),

    /// A value loaded fine but is unusable.
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Where and how to reach the NIS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NisSettings {
    pub address: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// Deadline for each send and receive; `0` waits forever.
    pub io_timeout_ms: u64,
}

/// Where and how to expose gauges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub address: String,
    pub port: u16,
    pub path: String,
    pub interval_secs: u64,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub nis: NisSettings,
    pub metrics: MetricsSettings,
    pub log_level: String,
}

/// Values given on the command line. `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub nis_address: Option<String>,
    pub nis_port: Option<u16>,
    pub connect_timeout_ms: Option<u64>,
    pub io_timeout_ms: Option<u64>,
    pub metrics_address: Option<String>,
    pub metrics_port: Option<u16>,
    pub metrics_path: Option<String>,
    pub metrics_interval_secs: Option<u64>,
    pub namespace: Option<String>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Load settings from every layer and validate the result.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, SettingsError> {
        Self::load_from(config_file, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_from(
        config_file: Option<&Path>,
        environment: Environment,
        overrides: &Overrides,
    ) -> Result<Self, SettingsError> {
        let mut builder = defaults(Config::builder())?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            environment
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = apply_overrides(builder, overrides)?
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that deserialize but cannot work.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.nis.address.trim().is_empty() {
            return Err(SettingsError::invalid("nis.address", "must not be empty"));
        }
        if self.nis.port == 0 {
            return Err(SettingsError::invalid("nis.port", "must be between 1 and 65535"));
        }
        if self.nis.connect_timeout_ms == 0 {
            return Err(SettingsError::invalid("nis.connect_timeout_ms", "must be greater than 0"));
        }
        if self.metrics.address.trim().is_empty() {
            return Err(SettingsError::invalid("metrics.address", "must not be empty"));
        }
        if self.metrics.port == 0 {
            return Err(SettingsError::invalid("metrics.port", "must be between 1 and 65535"));
        }
        if !self.metrics.path.starts_with('/') {
            return Err(SettingsError::invalid(
                "metrics.path",
                format!("{:?} must start with '/'", self.metrics.path),
            ));
        }
        if self.metrics.path == "/health" || self.metrics.path == "/healthz" {
            return Err(SettingsError::invalid(
                "metrics.path",
                format!("{} is reserved for the health check", self.metrics.path),
            ));
        }
        if self.metrics.interval_secs == 0 {
            return Err(SettingsError::invalid("metrics.interval_secs", "must be greater than 0"));
        }
        if !is_valid_namespace(&self.metrics.namespace) {
            return Err(SettingsError::invalid(
                "metrics.namespace",
                format!("{:?} is not a valid metric name prefix", self.metrics.namespace),
            ));
        }
        if LevelFilter::from_str(&self.log_level).is_err() {
            return Err(SettingsError::invalid(
                "log_level",
                format!(
                    "{:?} is not one of off, error, warn, info, debug, trace",
                    self.log_level
                ),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.nis.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        match self.nis.io_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.metrics.interval_secs)
    }

    pub fn nis_client(&self) -> NisClient {
        NisClient::builder()
            .host(self.nis.address.clone())
            .port(self.nis.port)
            .connect_timeout(self.connect_timeout())
            .io_timeout(self.io_timeout())
            .build()
    }

    pub fn prometheus_config(&self) -> PrometheusConfig {
        PrometheusConfig::builder()
            .listen_addr(socket_addr(&self.metrics.address, self.metrics.port))
            .metrics_path(self.metrics.path.clone())
            .build()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nis: NisSettings {
                address: DEFAULT_NIS_ADDRESS.to_string(),
                port: DEFAULT_NIS_PORT,
                connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
                io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            },
            metrics: MetricsSettings {
                address: DEFAULT_METRICS_ADDRESS.to_string(),
                port: DEFAULT_METRICS_PORT,
                path: DEFAULT_METRICS_PATH.to_string(),
                interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
                namespace: DEFAULT_NAMESPACE.to_string(),
            },
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

type Builder = ConfigBuilder<config::builder::DefaultState>;

fn defaults(builder: Builder) -> Result<Builder, ConfigError> {
    builder
        .set_default("nis.address", DEFAULT_NIS_ADDRESS)?
        .set_default("nis.port", DEFAULT_NIS_PORT)?
        .set_default("nis.connect_timeout_ms", DEFAULT_CONNECT_TIMEOUT_MS)?
        .set_default("nis.io_timeout_ms", DEFAULT_IO_TIMEOUT_MS)?
        .set_default("metrics.address", DEFAULT_METRICS_ADDRESS)?
        .set_default("metrics.port", DEFAULT_METRICS_PORT)?
        .set_default("metrics.path", DEFAULT_METRICS_PATH)?
        .set_default("metrics.interval_secs", DEFAULT_METRICS_INTERVAL_SECS)?
        .set_default("metrics.namespace", DEFAULT_NAMESPACE)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)
}

fn apply_overrides(builder: Builder, overrides: &Overrides) -> Result<Builder, ConfigError> {
    builder
        .set_override_option("nis.address", overrides.nis_address.clone())?
        .set_override_option("nis.port", overrides.nis_port)?
        .set_override_option("nis.connect_timeout_ms", overrides.connect_timeout_ms)?
        .set_override_option("nis.io_timeout_ms", overrides.io_timeout_ms)?
        .set_override_option("metrics.address", overrides.metrics_address.clone())?
        .set_override_option("metrics.port", overrides.metrics_port)?
        .set_override_option("metrics.path", overrides.metrics_path.clone())?
        .set_override_option("metrics.interval_secs", overrides.metrics_interval_secs)?
        .set_override_option("metrics.namespace", overrides.namespace.clone())?
        .set_override_option("log_level", overrides.log_level.clone())
}

// IPv6 literals need brackets before the port
fn socket_addr(address: &str, port: u16) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]:{}", address, port)
    } else {
        format!("{}:{}", address, port)
    }
}

// Empty, or `[a-zA-Z_][a-zA-Z0-9_]*`
fn is_valid_namespace(namespace: &str) -> bool {
    let mut chars = namespace.chars();
    match chars.next() {
        None => true,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    }
}
