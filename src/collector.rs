//! Periodic collection: fetch a status record and publish it as gauges.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use upswatch_exporter::{GaugeSink, Publisher};
use upswatch_nis::{FetchError, NisClient, StatusRecord};

/// Drives one [`NisClient`] on a fixed interval.
///
/// A failed fetch is logged and reported through the `up` gauge; the next
/// tick tries again.
#[derive(Debug)]
pub struct Collector<S> {
    client: NisClient,
    publisher: Publisher,
    sink: S,
    interval: Duration,
}

impl<S: GaugeSink + 'static> Collector<S> {
    pub fn new(client: NisClient, publisher: Publisher, sink: S, interval: Duration) -> Self {
        Self {
            client,
            publisher,
            sink,
            interval,
        }
    }

    /// Fetch one record and publish it, or publish the failure.
    pub async fn collect_once(&self) -> Result<StatusRecord, FetchError> {
        match self.client.fetch_snapshot().await {
            Ok(record) => {
                self.publisher.publish(&record, &self.sink);
                tracing::debug!(
                    status = record.ups.status.as_ref().map(|s| s.as_str()).unwrap_or("unknown"),
                    "published status record"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(
                    stage = %e.stage(),
                    error = %e,
                    host = %self.client.host(),
                    port = self.client.port(),
                    "status collection failed"
                );
                self.publisher.publish_failure(&self.sink);
                Err(e)
            }
        }
    }

    /// Start collecting in a background task. The first collection runs
    /// immediately.
    pub fn start(self) -> CollectorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(self.interval);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let _ = self.collect_once().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("collector stopped");
        });

        CollectorHandle { stop_tx, task }
    }
}

/// Handle to a running collector.
#[derive(Debug)]
pub struct CollectorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CollectorHandle {
    /// Signal the collector to stop after any in-flight collection, and wait.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }

    /// Returns true once the collector task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
