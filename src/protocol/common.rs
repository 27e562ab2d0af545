// (c) 2026 Ferry contributors

//! Stream plumbing shared by the client and server sides of the protocol

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Largest catalog we are prepared to read in one receive
pub const CATALOG_READ_LIMIT: usize = 65_536;
/// Largest control message (request, size response, ack, outcome) we are prepared to read in one receive
pub const CONTROL_READ_LIMIT: usize = 1_024;

/////////////////////////////////////////////////////////////////////////////////////////////
// STREAM TYPEDEFS

/// Marker trait for streams used for sending data
pub trait SendingStream: AsyncWrite + Send + Unpin {}
impl SendingStream for OwnedWriteHalf {}

#[cfg(test)]
impl SendingStream for tokio_test::io::Mock {}

/// Marker trait for streams used for receiving data
pub trait ReceivingStream: AsyncRead + Send + Unpin {}
impl ReceivingStream for OwnedReadHalf {}

#[cfg(test)]
impl ReceivingStream for tokio_test::io::Mock {}

/// Syntactic sugar helper type
#[derive(Debug)]
pub struct SendReceivePair<S: SendingStream, R: ReceivingStream> {
    /// outbound data
    pub send: S,
    /// inbound data
    pub recv: R,
}

impl<S: SendingStream, R: ReceivingStream> From<(S, R)> for SendReceivePair<S, R> {
    fn from(value: (S, R)) -> Self {
        Self {
            send: value.0,
            recv: value.1,
        }
    }
}

/// The halves of a TCP connection
pub type TcpStreamPair = SendReceivePair<OwnedWriteHalf, OwnedReadHalf>;

impl From<TcpStream> for TcpStreamPair {
    fn from(stream: TcpStream) -> Self {
        let (recv, send) = stream.into_split();
        Self { send, recv }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
// MESSAGE I/O

/// Sends a control message in a single write, then flushes.
pub async fn send_message<S: SendingStream>(send: &mut S, message: &[u8]) -> std::io::Result<()> {
    send.write_all(message).await?;
    send.flush().await
}

/// Performs exactly one receive of up to `limit` bytes.
///
/// An empty result means the peer closed the stream.
pub async fn receive_once<R: ReceivingStream>(
    recv: &mut R,
    limit: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; limit];
    let n = recv.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

/// As [`receive_once`], giving up with [`std::io::ErrorKind::TimedOut`] after `timeout`.
pub async fn receive_once_timed<R: ReceivingStream>(
    recv: &mut R,
    limit: usize,
    timeout: Duration,
) -> std::io::Result<Vec<u8>> {
    tokio::time::timeout(timeout, receive_once(recv, limit)).await?
}

/// Result of [`MessageReader::expect_token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRead {
    /// The message began with the expected token, which has been consumed
    Matched,
    /// Something else arrived; it has been kept for the next receive
    Mismatch,
    /// The peer closed the stream
    Closed,
}

/// Reads control messages one receive at a time, with the ability to push
/// back bytes which belong to the following message.
///
/// A peer which sends two messages in quick succession may find them delivered
/// by the same receive call; the reader splits off the expected part and keeps
/// the rest.
#[derive(Debug)]
pub struct MessageReader<R: ReceivingStream> {
    inner: R,
    pending: Vec<u8>,
}

impl<R: ReceivingStream> MessageReader<R> {
    /// Constructor
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Are there retained bytes waiting to be returned?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the next message: the retained bytes if there are any,
    /// otherwise the result of one receive.
    pub async fn receive(&mut self, limit: usize) -> std::io::Result<Vec<u8>> {
        if self.has_pending() {
            return Ok(std::mem::take(&mut self.pending));
        }
        receive_once(&mut self.inner, limit).await
    }

    /// Reads the next message and checks whether it begins with `token`.
    ///
    /// On a match only the token is consumed; anything after it is retained.
    /// On a mismatch the whole message is retained.
    pub async fn expect_token(&mut self, token: &[u8], limit: usize) -> std::io::Result<TokenRead> {
        let message = self.receive(limit).await?;
        if message.is_empty() {
            return Ok(TokenRead::Closed);
        }
        if let Some(rest) = message.strip_prefix(token) {
            self.pending = rest.to_vec();
            Ok(TokenRead::Matched)
        } else {
            self.pending = message;
            Ok(TokenRead::Mismatch)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio_test::io::Builder;

    use super::{receive_once_timed, MessageReader, TokenRead, CONTROL_READ_LIMIT};

    #[tokio::test]
    async fn coalesced_outcome_and_request_are_split() {
        let mock = Builder::new().read(b"successb.txt").build();
        let mut reader = MessageReader::new(mock);
        let r = reader
            .expect_token(b"success", CONTROL_READ_LIMIT)
            .await
            .unwrap();
        assert_eq!(r, TokenRead::Matched);
        assert!(reader.has_pending());
        let next = reader.receive(CONTROL_READ_LIMIT).await.unwrap();
        assert_eq!(next, b"b.txt");
    }

    #[tokio::test]
    async fn mismatch_is_kept_for_next_receive() {
        let mock = Builder::new().read(b"c.txt").build();
        let mut reader = MessageReader::new(mock);
        let r = reader
            .expect_token(b"success", CONTROL_READ_LIMIT)
            .await
            .unwrap();
        assert_eq!(r, TokenRead::Mismatch);
        let next = reader.receive(CONTROL_READ_LIMIT).await.unwrap();
        assert_eq!(next, b"c.txt");
    }

    #[tokio::test]
    async fn plain_outcome_leaves_nothing_behind() {
        let mock = Builder::new().read(b"success").build();
        let mut reader = MessageReader::new(mock);
        let r = reader
            .expect_token(b"success", CONTROL_READ_LIMIT)
            .await
            .unwrap();
        assert_eq!(r, TokenRead::Matched);
        assert!(!reader.has_pending());
    }

    #[tokio::test]
    async fn closed_stream() {
        let mock = Builder::new().build();
        let mut reader = MessageReader::new(mock);
        let r = reader
            .expect_token(b"success", CONTROL_READ_LIMIT)
            .await
            .unwrap();
        assert_eq!(r, TokenRead::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_receive_gives_up() {
        // the writer stays alive but silent
        let (mut reader, _writer) = tokio::io::simplex(64);
        let err = receive_once_timed(&mut reader, CONTROL_READ_LIMIT, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }
}
