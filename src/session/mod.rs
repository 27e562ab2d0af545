//! Per-file transfer sessions, client and server sides
// (c) 2026 Ferry contributors

use std::time::Duration;

use thiserror::Error;

mod fetch;
pub(crate) use fetch::{fetch_file, FetchSettings};
mod serve;
pub(crate) use serve::{serve_file, ServeOutcome};

/// Progress of one file through the wire.
///
/// Held by each side for the lifetime of a single transfer and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransferState {
    path: String,
    expected_size: u64,
    bytes_transferred: u64,
}

impl TransferState {
    pub(crate) fn new(path: &str, expected_size: u64) -> Self {
        Self {
            path: path.to_owned(),
            expected_size,
            bytes_transferred: 0,
        }
    }

    /// Accounts for `n` more bytes. Never overshoots the expected size.
    pub(crate) fn record(&mut self, n: u64) {
        debug_assert!(n <= self.remaining(), "{} overran its size", self.path);
        self.bytes_transferred = self
            .bytes_transferred
            .saturating_add(n)
            .min(self.expected_size);
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn expected_size(&self) -> u64 {
        self.expected_size
    }

    pub(crate) fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.expected_size - self.bytes_transferred
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.bytes_transferred == self.expected_size
    }

    /// Whole-number percentage; an empty file is always 100% done
    pub(crate) fn percent(&self) -> u64 {
        if self.expected_size == 0 {
            return 100;
        }
        let pct = u128::from(self.bytes_transferred) * 100 / u128::from(self.expected_size);
        u64::try_from(pct).unwrap_or(100)
    }
}

/// Ways a single file can fail to arrive
#[derive(Debug, Error)]
pub enum TransferError {
    /// The connection itself failed; nothing more can be fetched over it
    #[error("connection failed: {0}")]
    Transport(std::io::Error),
    /// The output file could not be written
    #[error("could not write output file: {0}")]
    Storage(std::io::Error),
    /// The server went quiet mid-file
    #[error("no data for {0:?}")]
    Timeout(Duration),
    /// The stream ended before the whole file arrived
    #[error("incomplete download: received {received} of {expected} bytes")]
    Incomplete {
        /// Negotiated size
        expected: u64,
        /// What actually arrived
        received: u64,
    },
    /// The server never gave a usable size
    #[error("gave up after {0} retries")]
    RetriesExhausted(u32),
    /// The user interrupted us
    #[error("cancelled")]
    Cancelled,
}

impl TransferError {
    /// Does this error end the whole run rather than just the current file?
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Cancelled)
    }
}

/// How a successful fetch went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileReport {
    pub(crate) bytes: u64,
    pub(crate) retries: u32,
    pub(crate) elapsed: Duration,
}
