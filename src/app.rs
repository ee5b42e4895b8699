use std::sync::Arc;

use log::info;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::config::ExporterConfig;
use crate::error::ExporterError;
use crate::invoker::{CommandRunner, SystemCommandRunner};
use crate::metrics::{Collector, ExporterRules, MetricRegistry, RefreshLoopHandle};
use crate::server;

/// Starts the refresh loop and the metrics endpoint. Only returns on a fatal
/// error; the caller is expected to exit non-zero and let a supervisor restart.
pub async fn run(config: &ExporterConfig) -> Result<(), ExporterError> {
    run_with_runner(config, Arc::new(SystemCommandRunner)).await
}

pub async fn run_with_runner(
    config: &ExporterConfig,
    runner: Arc<dyn CommandRunner>,
) -> Result<(), ExporterError> {
    info!(
        "Starting Exporter on {} (refresh every {:?})",
        config.listen_addr,
        config.refresh_interval()
    );
    let registry = Arc::new(MetricRegistry::new()?);
    let collector = Collector::new(
        Arc::clone(&registry),
        runner,
        ExporterRules::standard()?,
        config,
    )?;

    let listener = server::bind(&config.listen_addr).await?;
    let shutdown = CancellationToken::new();
    let mut endpoint = tokio::spawn(server::serve(listener, registry, shutdown.clone()));
    let refresh = RefreshLoopHandle::spawn(Arc::new(collector), config.refresh_interval());

    let result = select! {
        result = refresh.join() => result,
        result = &mut endpoint => result?,
    };
    shutdown.cancel();
    info!("Finishing Exporter");
    result
}
