use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::debug;
use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::extract::{extract_labeled, extract_network_identity, extract_scalars};
use super::registry::MetricRegistry;
use super::rules::ExporterRules;
use super::types::CycleReport;
use crate::config::{ExporterConfig, SourceCommand};
use crate::error::ExporterError;
use crate::invoker::CommandRunner;

/// One sampling pass over both sources.
pub struct Collector {
    registry: Arc<MetricRegistry>,
    runner: Arc<dyn CommandRunner>,
    rules: ExporterRules,
    powermetrics: SourceCommand,
    airport: SourceCommand,
}

impl Collector {
    pub fn new(
        registry: Arc<MetricRegistry>,
        runner: Arc<dyn CommandRunner>,
        rules: ExporterRules,
        config: &ExporterConfig,
    ) -> Result<Self, ExporterError> {
        rules.validate(&registry)?;
        Ok(Collector {
            registry,
            runner,
            rules,
            powermetrics: config.powermetrics.clone(),
            airport: config.airport.clone(),
        })
    }

    /// Runs powermetrics then airport. Blocks on both commands.
    pub fn refresh_once(&self) -> Result<CycleReport, ExporterError> {
        let started = Instant::now();
        self.registry.inc_refresh_cycles();

        let sample = self.runner.run_source(&self.powermetrics)?;
        let powermetrics = extract_scalars(&sample, &self.rules.powermetrics, &self.registry)?;

        let sample = self.runner.run_source(&self.airport)?;
        let identity = extract_network_identity(&sample, &self.rules.identity)?;
        let airport = extract_labeled(&sample, &self.rules.airport, &identity, &self.registry)?;

        Ok(CycleReport::new(
            Utc::now(),
            started.elapsed(),
            powermetrics,
            airport,
            identity,
        ))
    }
}

/// Background refresh loop: sample, sleep, repeat. The task only finishes on
/// cancellation (`Ok`) or on the first fatal error (`Err`).
pub struct RefreshLoopHandle {
    task: JoinHandle<Result<(), ExporterError>>,
    cancel: CancellationToken,
}

impl RefreshLoopHandle {
    /// Must be called from within a tokio runtime.
    pub fn spawn(collector: Arc<Collector>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(collector, interval, cancel.clone()));
        RefreshLoopHandle { task, cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn join(mut self) -> Result<(), ExporterError> {
        (&mut self.task).await?
    }
}

async fn run(
    collector: Arc<Collector>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<(), ExporterError> {
    loop {
        let cycle = Arc::clone(&collector);
        let report = tokio::task::spawn_blocking(move || cycle.refresh_once()).await??;
        debug!(
            "refresh at {}: powermetrics {} updated/{} skipped, airport {} updated/{} skipped for {} ({}) in {}ms",
            report.collected_at,
            report.powermetrics.updated,
            report.powermetrics.skipped,
            report.airport.updated,
            report.airport.skipped,
            report.identity.ssid,
            report.identity.bssid,
            report.latency_ms
        );

        select! {
            _ = cancel.cancelled() => {
                return Ok(());
            }
            _ = sleep(interval) => {}
        }
    }
}

impl Drop for RefreshLoopHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
