use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use upswatch::{logging, Cli, Collector, Settings};
use upswatch_exporter::prometheus::PrometheusExporter;
use upswatch_exporter::{GaugeRegistry, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings =
        Settings::load(cli.config.as_deref(), &cli.overrides()).context("failed to load settings")?;
    logging::init(&settings.log_level).context("failed to install the log subscriber")?;

    // One-shot mode: print the decoded record and exit
    if cli.once {
        return print_once(&settings).await;
    }

    run(settings).await
}

async fn print_once(settings: &Settings) -> Result<()> {
    let client = settings.nis_client();
    let record = client.fetch_snapshot().await.with_context(|| {
        format!(
            "failed to fetch status from {}:{}",
            client.host(),
            client.port()
        )
    })?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    let registry = Arc::new(GaugeRegistry::new());
    let publisher = Publisher::new(&settings.metrics.namespace);
    publisher.describe(&registry);

    let server = PrometheusExporter::new(settings.prometheus_config(), registry.clone())
        .start_server()
        .await
        .context("failed to start the metrics endpoint")?;

    tracing::info!(
        nis = %format!("{}:{}", settings.nis.address, settings.nis.port),
        interval_secs = settings.metrics.interval_secs,
        "starting collector"
    );
    let collector = Collector::new(
        settings.nis_client(),
        publisher,
        registry,
        settings.interval(),
    )
    .start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;

    tracing::info!("shutting down");
    collector.stop().await;
    server.shutdown().await;

    Ok(())
}
