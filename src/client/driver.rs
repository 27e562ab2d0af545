//! Drives a list of downloads over one connection
// (c) 2026 Ferry contributors

use std::io::ErrorKind;
use std::sync::Arc;

use human_repr::HumanCount as _;
use indicatif::MultiProgress;
use tokio::io::AsyncWriteExt as _;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument as _};

use super::{progress::file_bar, Schedule};
use crate::{
    catalog::Catalog,
    protocol::common::{
        receive_once_timed, ReceivingStream, SendReceivePair, SendingStream, CATALOG_READ_LIMIT,
    },
    session::{fetch_file, FetchSettings},
    util::{stats::DataRate, RunStats},
    Configuration,
};

/// Client end of a connection.
///
/// Each file is fetched by its own task, but only one task at a time holds the stream,
/// and the driver waits for each to finish before starting the next.
#[derive(Debug)]
pub struct Downloader<S: SendingStream, R: ReceivingStream> {
    stream: Arc<Mutex<SendReceivePair<S, R>>>,
    settings: FetchSettings,
    response_timeout: std::time::Duration,
    display: MultiProgress,
    quiet: bool,
    cancel: CancellationToken,
}

impl<S, R> Downloader<S, R>
where
    S: SendingStream + 'static,
    R: ReceivingStream + 'static,
{
    /// Constructor
    pub fn new(
        stream: SendReceivePair<S, R>,
        config: &Configuration,
        display: MultiProgress,
        quiet: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
            settings: FetchSettings::from(config),
            response_timeout: config.response_timeout_duration(),
            display,
            quiet,
            cancel,
        }
    }

    /// Reads the catalog, which the server sends as soon as we connect.
    ///
    /// A server with nothing to offer sends nothing, so silence is read as an empty catalog.
    pub async fn receive_catalog(&self) -> anyhow::Result<Catalog> {
        let mut stream = self.stream.lock().await;
        match receive_once_timed(&mut stream.recv, CATALOG_READ_LIMIT, self.response_timeout).await {
            Ok(payload) if payload.is_empty() => {
                anyhow::bail!("server closed the connection before sending its catalog")
            }
            Ok(payload) => Ok(Catalog::from_wire(&payload)?),
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                debug!("no catalog within {:?}", self.response_timeout);
                Ok(Catalog::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches the scheduled files in order.
    ///
    /// A failed file is cleaned up and the run moves on; a broken connection or an interrupt stops it.
    pub async fn run(&self, schedule: Schedule) -> anyhow::Result<RunStats> {
        let start = Instant::now();
        let mut stats = RunStats {
            rejected: schedule.rejected.len(),
            ..RunStats::default()
        };
        let mut jobs = schedule.jobs.into_iter();

        while !self.cancel.is_cancelled() {
            let Some(job) = jobs.next() else { break };
            let bar = file_bar(&self.display, &job.request.path, self.quiet);
            let span = info_span!("fetch", file = %job.request.path);

            let stream = Arc::clone(&self.stream);
            let settings = self.settings;
            let cancel = self.cancel.clone();
            let task_bar = bar.clone();
            let handle = tokio::spawn(
                async move {
                    let mut stream = stream.lock().await;
                    let result = fetch_file(&mut *stream, &job, settings, &task_bar, &cancel).await;
                    (job, result)
                }
                .instrument(span),
            );
            let (job, result) = match handle.await {
                Ok(r) => r,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => anyhow::bail!("download task failed: {e}"),
            };

            match result {
                Ok(report) => {
                    bar.finish_and_clear();
                    stats.downloaded += 1;
                    stats.bytes += report.bytes;
                    info!(
                        "{}: {} in {:.1?} ({}/s){}",
                        job.request.path,
                        report.bytes.human_count_bytes(),
                        report.elapsed,
                        DataRate::new(report.bytes, report.elapsed),
                        match report.retries {
                            0 => String::new(),
                            n => format!(" after {n} retries"),
                        }
                    );
                }
                Err(e) => {
                    bar.abandon();
                    stats.failed += 1;
                    error!("{}: {e}", job.request.path);
                    if e.is_fatal() {
                        break;
                    }
                }
            }
        }
        stats.skipped = jobs.len();
        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// Tells the server we are done
    pub async fn close(self) -> anyhow::Result<()> {
        let mut stream = self.stream.lock().await;
        match stream.send.shutdown().await {
            Err(e) if e.kind() != ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }
}
