//! Server event loop
// (c) 2026 Ferry contributors

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::io::AsyncWriteExt as _;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument as _};

use crate::{
    catalog::Catalog,
    protocol::common::{
        send_message, MessageReader, ReceivingStream, SendReceivePair, SendingStream, TcpStreamPair,
        CONTROL_READ_LIMIT,
    },
    session::{serve_file, ServeOutcome},
    Configuration,
};

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConnectionState {
    CatalogSent,
    AwaitingRequest,
    Serving(String),
    Closed,
}

/// A listening file server
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    root: PathBuf,
    chunk_size: usize,
    limit: Option<Arc<Semaphore>>,
}

impl Server {
    /// Binds the listening socket
    pub async fn bind(config: &Configuration) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.root.is_dir(),
            "served directory {} does not exist",
            config.root.display()
        );
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to listen on {address}"))?;
        Ok(Self {
            listener,
            root: config.root.clone(),
            chunk_size: config.chunk_size_bytes(),
            limit: config
                .connection_limit()
                .map(|n| Arc::new(Semaphore::new(n))),
        })
    }

    /// The address we are actually listening on
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and serves connections until `shutdown` is cancelled, then waits for the
    /// connections in flight to wind up.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        info!(
            "Serving {} on {}",
            self.root.display(),
            self.local_addr()?
        );
        let root: Arc<Path> = self.root.into();
        let mut tasks = JoinSet::new();

        loop {
            let permit = match &self.limit {
                Some(limit) => tokio::select! {
                    p = Arc::clone(limit).acquire_owned() => Some(p?),
                    () = shutdown.cancelled() => break,
                },
                None => None,
            };
            let (stream, peer) = tokio::select! {
                r = self.listener.accept() => match r {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("accept failed: {e}");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                () = shutdown.cancelled() => break,
            };
            info!("Connection from {peer}");
            let root = Arc::clone(&root);
            let chunk_size = self.chunk_size;
            let token = shutdown.child_token();
            let _ = tasks.spawn(
                async move {
                    let _permit = permit;
                    tokio::select! {
                        r = handle_connection(TcpStreamPair::from(stream), &root, chunk_size) => {
                            if let Err(e) = r {
                                warn!("connection failed: {e:#}");
                            }
                        }
                        () = token.cancelled() => debug!("shutting down"),
                    }
                    info!("Connection closed");
                }
                .instrument(info_span!("conn", %peer)),
            );
            while let Some(done) = tasks.try_join_next() {
                if let Err(e) = done {
                    error!("connection task failed: {e}");
                }
            }
        }

        trace!("waiting for {} connections", tasks.len());
        while let Some(done) = tasks.join_next().await {
            if let Err(e) = done {
                error!("connection task failed: {e}");
            }
        }
        info!("Server stopped");
        Ok(())
    }
}

/// Runs the protocol for one client: the catalog, then one request at a time until the client leaves.
pub(crate) async fn handle_connection<S: SendingStream, R: ReceivingStream>(
    stream: SendReceivePair<S, R>,
    root: &Path,
    chunk_size: usize,
) -> anyhow::Result<()> {
    let SendReceivePair { mut send, recv } = stream;
    let mut reader = MessageReader::new(recv);

    let owned_root = root.to_path_buf();
    let catalog = tokio::task::spawn_blocking(move || Catalog::build(&owned_root)).await??;
    debug!("offering {} files", catalog.len());
    send_message(&mut send, &catalog.to_wire()).await?;
    let mut state = ConnectionState::CatalogSent;

    loop {
        state = match state {
            ConnectionState::CatalogSent | ConnectionState::AwaitingRequest => {
                let request = reader.receive(CONTROL_READ_LIMIT).await?;
                match std::str::from_utf8(&request).map(str::trim) {
                    Ok("") => ConnectionState::Closed,
                    Ok(path) => ConnectionState::Serving(path.to_owned()),
                    Err(_) => {
                        warn!("undecodable request; closing");
                        ConnectionState::Closed
                    }
                }
            }
            ConnectionState::Serving(path) => {
                debug!("request for {path:?}");
                match serve_file(&mut send, &mut reader, root, &path, chunk_size).await? {
                    ServeOutcome::Closed => ConnectionState::Closed,
                    ServeOutcome::Refused | ServeOutcome::Confirmed | ServeOutcome::Unconfirmed => {
                        ConnectionState::AwaitingRequest
                    }
                }
            }
            ConnectionState::Closed => break,
        };
    }
    let _ = send.shutdown().await;
    Ok(())
}
