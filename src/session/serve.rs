//! Server side of a single file transfer
// (c) 2026 Ferry contributors

use std::path::Path;

use anyhow::Context as _;
use tokio::fs::File;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tracing::{debug, info, trace, warn};

use super::TransferState;
use crate::{
    protocol::{
        common::{send_message, MessageReader, ReceivingStream, SendingStream, TokenRead, CONTROL_READ_LIMIT},
        message::{size_response, END, ERROR, SUCCESS},
    },
    util::path::resolve_under_root,
};

/// How a request ended, from the server's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServeOutcome {
    /// Not a servable file; `error` was sent
    Refused,
    /// Sent, and the client said `success`
    Confirmed,
    /// Sent, but the client said something else
    Unconfirmed,
    /// The client went away
    Closed,
}

async fn open_servable(root: &Path, request: &str) -> anyhow::Result<(File, u64)> {
    let path = resolve_under_root(root, request)?;
    let meta = tokio::fs::metadata(&path).await?;
    anyhow::ensure!(meta.is_file(), "not a regular file");
    let file = File::open(&path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    Ok((file, meta.len()))
}

/// Serves one request: size, acknowledgement, data, completion marker, outcome.
///
/// Errors are connection failures. Anything the client sends in place of `success` is left in `reader`
/// to be handled as its next request.
pub(crate) async fn serve_file<S: SendingStream, R: ReceivingStream>(
    send: &mut S,
    reader: &mut MessageReader<R>,
    root: &Path,
    request: &str,
    chunk_size: usize,
) -> anyhow::Result<ServeOutcome> {
    let (mut file, size) = match open_servable(root, request).await {
        Ok(f) => f,
        Err(e) => {
            debug!("refusing {request:?}: {e:#}");
            send_message(send, ERROR).await?;
            return Ok(ServeOutcome::Refused);
        }
    };
    send_message(send, &size_response(size)).await?;

    // any reply at all counts as the acknowledgement
    let ack = reader.receive(CONTROL_READ_LIMIT).await?;
    if ack.is_empty() {
        return Ok(ServeOutcome::Closed);
    }

    let mut state = TransferState::new(request, size);
    let mut buf = vec![0u8; chunk_size.max(1)];
    while !state.is_complete() {
        let want = usize::try_from(state.remaining()).map_or(buf.len(), |r| r.min(buf.len()));
        let n = file.read(&mut buf[..want]).await?;
        if n == 0 {
            warn!(
                "{request}: file shrank while being sent; {} of {size} bytes went out",
                state.bytes_transferred()
            );
            break;
        }
        send.write_all(&buf[..n]).await?;
        state.record(n as u64);
        trace!("{request}: {}%", state.percent());
    }
    send_message(send, END).await?;

    Ok(match reader.expect_token(SUCCESS, CONTROL_READ_LIMIT).await? {
        TokenRead::Matched => {
            info!("{request}: successfully downloaded by client");
            ServeOutcome::Confirmed
        }
        TokenRead::Mismatch => {
            warn!("{request}: client did not confirm the download");
            ServeOutcome::Unconfirmed
        }
        TokenRead::Closed => {
            warn!("{request}: client disconnected before confirming the download");
            ServeOutcome::Closed
        }
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    use super::{serve_file, ServeOutcome};
    use crate::protocol::{
        common::{receive_once, send_message, MessageReader},
        message::{ACK, ERROR, SUCCESS},
        test_helpers::{new_test_plumbing, TestStreamPair},
    };

    fn served_root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), b"hello world").unwrap();
        std::fs::write(dir.path().join("secret"), b"top secret").unwrap();
        (dir, root)
    }

    fn spawn_serve(
        server: TestStreamPair,
        root: PathBuf,
        request: &'static str,
    ) -> tokio::task::JoinHandle<(ServeOutcome, Vec<u8>)> {
        tokio::spawn(async move {
            let TestStreamPair { mut send, recv } = server;
            let mut reader = MessageReader::new(recv);
            let outcome = serve_file(&mut send, &mut reader, &root, request, 4).await.unwrap();
            let leftover = if reader.has_pending() {
                reader.receive(1024).await.unwrap()
            } else {
                Vec::new()
            };
            (outcome, leftover)
        })
    }

    #[tokio::test]
    async fn refusals() {
        let (_dir, root) = served_root();
        for request in ["missing.txt", "sub", "../secret", "/etc/passwd", ""] {
            let (mut client, server) = new_test_plumbing();
            let task = spawn_serve(server, root.clone(), request);
            let reply = receive_once(&mut client.recv, 1024).await.unwrap();
            assert_eq!(reply, ERROR, "{request:?}");
            assert_eq!(task.await.unwrap().0, ServeOutcome::Refused);
        }
    }

    async fn client_side(client: &mut TestStreamPair, outcome: &[u8]) -> Vec<u8> {
        let reply = receive_once(&mut client.recv, 1024).await.unwrap();
        assert_eq!(reply, b"begin11");
        send_message(&mut client.send, ACK).await.unwrap();
        let mut body = vec![0u8; 11 + 3];
        let _ = client.recv.read_exact(&mut body).await.unwrap();
        send_message(&mut client.send, outcome).await.unwrap();
        body
    }

    #[tokio::test]
    async fn confirmed() {
        let (_dir, root) = served_root();
        let (mut client, server) = new_test_plumbing();
        let task = spawn_serve(server, root, "a.txt");
        let body = client_side(&mut client, SUCCESS).await;
        assert_eq!(body, b"hello worldend");
        assert_eq!(task.await.unwrap(), (ServeOutcome::Confirmed, Vec::new()));
    }

    #[tokio::test]
    async fn outcome_coalesced_with_next_request() {
        let (_dir, root) = served_root();
        let (mut client, server) = new_test_plumbing();
        let task = spawn_serve(server, root, "a.txt");
        let _ = client_side(&mut client, b"successb.txt").await;
        assert_eq!(
            task.await.unwrap(),
            (ServeOutcome::Confirmed, b"b.txt".to_vec())
        );
    }

    #[tokio::test]
    async fn unconfirmed_keeps_next_request() {
        let (_dir, root) = served_root();
        let (mut client, server) = new_test_plumbing();
        let task = spawn_serve(server, root, "a.txt");
        let _ = client_side(&mut client, b"b.txt").await;
        assert_eq!(
            task.await.unwrap(),
            (ServeOutcome::Unconfirmed, b"b.txt".to_vec())
        );
    }

    #[tokio::test]
    async fn client_leaves_before_ack() {
        let (_dir, root) = served_root();
        let (mut client, server) = new_test_plumbing();
        let task = spawn_serve(server, root, "a.txt");
        let reply = receive_once(&mut client.recv, 1024).await.unwrap();
        assert_eq!(reply, b"begin11");
        client.send.shutdown().await.unwrap();
        assert_eq!(task.await.unwrap().0, ServeOutcome::Closed);
    }
}
