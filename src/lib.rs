// (c) 2026 Ferry contributors

#![allow(clippy::doc_markdown)]
//! Ferry is a small file transfer tool. A server offers a directory tree over TCP;
//! a client fetches a chosen subset of it, most urgent files first.
//!
//! ## 📖 Documentation
//!
//! * [The wire protocol](protocol)
//! * [Configuring ferry](config)
//!
//! ## Overview
//!
//! - One TCP connection per client; one file in flight at a time
//! - The server sends its catalog as soon as a client connects
//! - The client reads a manifest of wanted files, each tagged `CRITICAL`, `HIGH` or `NORMAL`,
//!   and fetches them in that order
//! - A refused or garbled size reply is retried after the file's priority delay;
//!   optionally the retries can be capped (`--max-retries`)
//! - A stalled or truncated download is abandoned and its partial output deleted
//!
//! #### What ferry is not
//!
//! * Secure. There is no authentication and no encryption.
//! * Resumable. A file that fails is fetched from the start next time.
//!
//! ## 🧰 Getting Started
//!
//! ```text
//! ferry --server --root /srv/files        # on the server
//! ferry --host server.example --list      # see what is on offer
//! ferry --host server.example -m wanted.txt -o downloads
//! ```
//!
//! where `wanted.txt` looks like
//!
//! ```text
//! report.pdf   CRITICAL
//! logs/today.log  HIGH
//! photos/cat.jpg
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;

pub(crate) mod cli;
pub use cli::{cli, styles};

pub mod client;

pub mod config;
pub use config::Configuration;

pub mod protocol;

pub mod server;

pub(crate) mod session;
pub use session::TransferError;

pub mod util;

// Used by the Optionalify template
#[doc(hidden)]
pub use derive_deftly;
derive_deftly::template_export_semver_check!("0.14.0");
