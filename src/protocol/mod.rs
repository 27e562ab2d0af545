// (c) 2026 Ferry contributors

//! 📖 The ferry wire protocol
//!
//! A ferry session runs over a single TCP stream. All control messages are
//! short UTF-8 strings without any framing; file contents are sent raw.
//! Each side relies on the fact that its peer always waits for a reply before
//! sending the next message, so a single receive call normally returns exactly
//! one message.
//!
//! ### Catalog
//!
//! * S ➡️ C: the comma-joined list of every file the server offers, as relative
//!   paths with `/` separators. Paths containing a comma are never offered.
//!
//! The client reads the catalog with one receive of at most
//! [`CATALOG_READ_LIMIT`](common::CATALOG_READ_LIMIT) bytes. A catalog which
//! is split across several transport segments will be truncated; this is a
//! known limitation of the wire format.
//!
//! ### Per-file transfer
//!
//! * C ➡️ S: the requested path, bare.
//! * S ➡️ C: `error` if the path is not a regular file under the served root,
//!   otherwise `begin<N>` where `N` is the file size in decimal. The client also
//!   accepts `end<N>` and a bare `<N>`.
//!   * On `error` (or anything which cannot be parsed) the client waits for the
//!     file's retry delay and sends the same request again. The server keeps no
//!     state between attempts.
//! * C ➡️ S: `ack`
//! * S ➡️ C: exactly `N` bytes of file data, in blocks of the server's chunk size.
//! * S ➡️ C: `end`
//! * C ➡️ S: `success` if all `N` bytes arrived. On failure the client sends
//!   nothing and moves on to its next request.
//!
//! Only one file is ever in flight on a connection.
//! The session ends when the client closes the stream or sends an empty request.
//!
//! Message constants and parsers live in [`message`]; stream plumbing in [`common`].

pub mod common;
pub mod message;

#[cfg(test)]
pub(crate) mod test_helpers;
