//! Client side of a single file transfer
// (c) 2026 Ferry contributors

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::io::{AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{FileReport, TransferError, TransferState};
use crate::{
    client::ScheduledJob,
    protocol::{
        common::{
            receive_once_timed, send_message, ReceivingStream, SendReceivePair, SendingStream,
            CONTROL_READ_LIMIT,
        },
        message::{parse_size_response, NegotiationError, ACK, END, SUCCESS},
    },
    Configuration,
};

/// Client knobs which apply to every file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchSettings {
    /// Largest single read of file data
    pub(crate) receive_chunk: usize,
    /// Longest wait for each read of file data
    pub(crate) chunk_timeout: Duration,
    /// Longest wait for a size reply
    pub(crate) response_timeout: Duration,
    /// Retries allowed per file; `None` is unbounded
    pub(crate) retry_budget: Option<u32>,
}

impl From<&Configuration> for FetchSettings {
    fn from(config: &Configuration) -> Self {
        Self {
            receive_chunk: config.receive_chunk_bytes().max(1),
            chunk_timeout: config.chunk_timeout_duration(),
            response_timeout: config.response_timeout_duration(),
            retry_budget: config.retry_budget(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Negotiated {
    size: u64,
    retries: u32,
}

/// Sends one size request and interprets the reply.
///
/// The outer error is a broken connection; the inner one is worth retrying.
async fn request_size<S: SendingStream, R: ReceivingStream>(
    stream: &mut SendReceivePair<S, R>,
    path: &str,
    timeout: Duration,
) -> Result<Result<u64, NegotiationError>, TransferError> {
    send_message(&mut stream.send, path.as_bytes())
        .await
        .map_err(TransferError::Transport)?;
    match receive_once_timed(&mut stream.recv, CONTROL_READ_LIMIT, timeout).await {
        Ok(reply) if reply.is_empty() => Err(TransferError::Transport(ErrorKind::UnexpectedEof.into())),
        Ok(reply) => Ok(parse_size_response(&reply)),
        Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Err(NegotiationError::Timeout(timeout))),
        Err(e) => Err(TransferError::Transport(e)),
    }
}

/// Asks for the file's size until the server gives one, then acknowledges it.
async fn negotiate<S: SendingStream, R: ReceivingStream>(
    stream: &mut SendReceivePair<S, R>,
    path: &str,
    retry_delay: Duration,
    settings: FetchSettings,
) -> Result<Negotiated, TransferError> {
    let mut retries = 0u32;
    loop {
        match request_size(stream, path, settings.response_timeout).await? {
            Ok(size) => {
                send_message(&mut stream.send, ACK)
                    .await
                    .map_err(TransferError::Transport)?;
                debug!("{path}: size {size} after {retries} retries");
                return Ok(Negotiated { size, retries });
            }
            Err(e) => {
                if settings.retry_budget.is_some_and(|budget| retries >= budget) {
                    warn!("{path}: {e}; no retries left");
                    return Err(TransferError::RetriesExhausted(retries));
                }
                retries += 1;
                debug!("{path}: {e}; retry {retries} in {retry_delay:?}");
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

/// Reads exactly the negotiated number of bytes into `out`.
///
/// A write failure does not stop the reading, so that the stream stays in step with the server;
/// it is reported once the body has been consumed.
async fn receive_body<R: ReceivingStream, W: AsyncWrite + Unpin>(
    recv: &mut R,
    out: &mut W,
    state: &mut TransferState,
    settings: FetchSettings,
    bar: &ProgressBar,
) -> Result<(), TransferError> {
    let mut buf = vec![0u8; settings.receive_chunk.max(1)];
    let mut storage_error = None;
    while !state.is_complete() {
        let want = usize::try_from(state.remaining()).map_or(buf.len(), |r| r.min(buf.len()));
        let n = match tokio::time::timeout(settings.chunk_timeout, recv.read(&mut buf[..want])).await {
            Err(_) => return Err(TransferError::Timeout(settings.chunk_timeout)),
            Ok(Err(e)) => return Err(TransferError::Transport(e)),
            Ok(Ok(0)) => {
                return Err(TransferError::Incomplete {
                    expected: state.expected_size(),
                    received: state.bytes_transferred(),
                })
            }
            Ok(Ok(n)) => n,
        };
        if storage_error.is_none() {
            if let Err(e) = out.write_all(&buf[..n]).await {
                warn!("{}: write failed: {e}", state.path());
                storage_error = Some(e);
            }
        }
        state.record(n as u64);
        bar.set_position(state.bytes_transferred());
        trace!("{}: {}%", state.path(), state.percent());
    }
    if let Some(e) = storage_error {
        return Err(TransferError::Storage(e));
    }
    out.flush().await.map_err(TransferError::Storage)
}

/// Consumes the server's completion marker.
async fn drain_completion_marker<R: ReceivingStream>(recv: &mut R, timeout: Duration) {
    let mut marker = [0u8; END.len()];
    match tokio::time::timeout(timeout, recv.read_exact(&mut marker)).await {
        Ok(Ok(_)) if marker == END => (),
        Ok(Ok(_)) => debug!("unexpected completion marker {:?}", String::from_utf8_lossy(&marker)),
        Ok(Err(e)) => debug!("completion marker not read: {e}"),
        Err(_) => debug!("no completion marker within {timeout:?}"),
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("could not remove partial file {}: {e}", path.display());
        }
    }
}

async fn create_output(destination: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::File::create(destination).await
}

/// Fetches one file: negotiation, body, outcome.
///
/// The output file is only created once a size has been agreed, so a failed negotiation
/// leaves the local filesystem untouched.
/// On any later failure the output file is removed and `success` is not sent.
pub(crate) async fn fetch_file<S: SendingStream, R: ReceivingStream>(
    stream: &mut SendReceivePair<S, R>,
    job: &ScheduledJob,
    settings: FetchSettings,
    bar: &ProgressBar,
    cancel: &CancellationToken,
) -> Result<FileReport, TransferError> {
    let start = Instant::now();
    let path = job.request.path.as_str();

    let negotiated = tokio::select! {
        r = negotiate(stream, path, job.retry_delay, settings) => r,
        () = cancel.cancelled() => Err(TransferError::Cancelled),
    };
    let negotiated = negotiated?;
    bar.set_length(negotiated.size);

    let mut state = TransferState::new(path, negotiated.size);
    let output = create_output(&job.destination).await;
    let created = output.is_ok();
    let result = match output {
        Ok(mut file) => {
            tokio::select! {
                r = receive_body(&mut stream.recv, &mut file, &mut state, settings, bar) => r,
                () = cancel.cancelled() => Err(TransferError::Cancelled),
            }
        }
        Err(e) => {
            // The size is already acknowledged; consume the body to stay in step.
            warn!("{}: {e}", job.destination.display());
            let mut sink = tokio::io::sink();
            let drained = tokio::select! {
                r = receive_body(&mut stream.recv, &mut sink, &mut state, settings, bar) => r,
                () = cancel.cancelled() => Err(TransferError::Cancelled),
            };
            drained.and(Err(TransferError::Storage(e)))
        }
    };
    let result = match result {
        Ok(()) if !state.is_complete() => Err(TransferError::Incomplete {
            expected: state.expected_size(),
            received: state.bytes_transferred(),
        }),
        other => other,
    };
    if let Err(e) = result {
        if matches!(e, TransferError::Storage(_)) {
            drain_completion_marker(&mut stream.recv, settings.chunk_timeout).await;
        }
        if created {
            discard(&job.destination).await;
        }
        return Err(e);
    }

    drain_completion_marker(&mut stream.recv, settings.chunk_timeout).await;
    send_message(&mut stream.send, SUCCESS)
        .await
        .map_err(TransferError::Transport)?;
    Ok(FileReport {
        bytes: state.bytes_transferred(),
        retries: negotiated.retries,
        elapsed: start.elapsed(),
    })
}
