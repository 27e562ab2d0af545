//! Main client mode event loop
// (c) 2026 Ferry contributors

use std::io::ErrorKind;

use anyhow::Context as _;
use indicatif::MultiProgress;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace_span, warn, Instrument as _};

use super::{manifest::read_manifest, schedule, Downloader, Parameters, Priority, TransferRequest};
use crate::{
    config::Configuration,
    protocol::common::TcpStreamPair,
    util::{self, RunStats},
};

async fn connect(config: &Configuration) -> anyhow::Result<TcpStream> {
    let address = config.address();
    match timeout(config.response_timeout_duration(), TcpStream::connect(&address)).await {
        Err(_) => anyhow::bail!("Timed out connecting to {address}"),
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
            anyhow::bail!("Connection to {address} refused. Make sure the server is running.")
        }
        Ok(r) => r.with_context(|| format!("Failed to connect to {address}")),
    }
}

async fn requests(config: &Configuration, parameters: &Parameters) -> anyhow::Result<Vec<TransferRequest>> {
    if parameters.files.is_empty() {
        read_manifest(&config.manifest).await
    } else {
        Ok(parameters
            .files
            .iter()
            .map(|f| TransferRequest::new(f.as_str(), Priority::Normal))
            .collect())
    }
}

/// Main client mode event loop
///
/// # Return value
/// `true` if every requested file arrived.
///
// Caution: As we are using ProgressBar, anything to be printed to console should use progress.println() !
pub async fn client_main(
    config: &Configuration,
    parameters: &Parameters,
    display: MultiProgress,
) -> anyhow::Result<bool> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let _watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping");
            interrupt.cancel();
        }
    });

    let stream = connect(config).await?;
    debug!("connected to {}", config.address());
    let downloader = Downloader::new(
        TcpStreamPair::from(stream),
        config,
        display.clone(),
        parameters.quiet,
        cancel.clone(),
    );

    let catalog = downloader.receive_catalog().await?;
    if catalog.is_empty() {
        anyhow::bail!("No files received from server");
    }
    info!("Server offers {} file(s)", catalog.len());

    if parameters.list {
        for entry in catalog.entries() {
            display.suspend(|| println!("{entry}"));
        }
        downloader.close().await?;
        return Ok(true);
    }

    let plan = schedule(requests(config, parameters).await?, &catalog, config);
    for rejection in &plan.rejected {
        warn!("Invalid file: {rejection}");
    }
    if plan.jobs.is_empty() {
        warn!("Nothing to download");
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let stats: RunStats = downloader
        .run(plan)
        .instrument(trace_span!("CLIENT"))
        .await?;
    downloader.close().await?;
    if !parameters.quiet {
        util::stats::report(&stats);
    }
    if cancel.is_cancelled() {
        anyhow::bail!("Interrupted");
    }
    Ok(stats.all_succeeded())
}
