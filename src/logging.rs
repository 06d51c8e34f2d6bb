//! Tracing subscriber setup.

use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the event filter: `level` is the default directive and the
/// directives in `env` (normally `RUST_LOG`) refine it.
pub fn build_filter(level: &str, env: &str) -> EnvFilter {
    let default = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(env)
}

/// Install the global subscriber. Logs go to stderr so `--once` output on
/// stdout stays machine readable.
pub fn init(level: &str) -> Result<(), TryInitError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(build_filter(level, &env)),
        )
        .try_init()
}
