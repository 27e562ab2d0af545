// (c) 2026 Ferry contributors
//! # 📖 Configuration management
//!
//! ferry obtains run-time configuration from the following sources, highest priority first:
//! 1. Command-line options
//! 2. Environment variables named after the field, in upper case, prefixed `FERRY_`
//!    (for example `FERRY_PORT=9000`, `FERRY_OUTPUT_DIR=downloads`)
//! 3. A configuration file given with `--config-file`
//! 4. The user's configuration file
//!    * On Unix, this is `~/.config/ferry/ferry.toml`
//!    * On Windows, this is `%AppData%\Roaming\ferry\ferry.toml`
//! 5. The system-wide configuration file, `/etc/ferry.toml` (Unix only)
//! 6. Hard-wired defaults
//!
//! Run `ferry --config-files` for a list of which files we read.
//!
//! ## File format
//!
//! Configuration files are [TOML](https://toml.io/). Each option is a top-level key,
//! named exactly as the [Configuration] field (`snake_case`).
//!
//! ## Configurable options
//!
//! The set of supported fields is the [Configuration] structure.
//! On the command line, they are given in kebab-case.
//!
//! * `ferry --show-config` outputs the fields, their current values, and where each value came from.
//! * For an explanation of each field, refer to `ferry --help`.
//!
//! ## Example
//!
//! ```toml
//! # Serve a shared directory to the whole LAN
//! host = "0.0.0.0"
//! root = "/srv/ferry"
//! max_connections = 16
//!
//! # Client side: keep the server's directory layout, and give up on
//! # files which are still missing after ten attempts
//! collision = "namespace"
//! max_retries = 10
//! ```

pub mod structure;
pub use structure::{Configuration, Configuration_Optional};

mod manager;
pub use manager::Manager;

mod prettyprint;
pub use prettyprint::DisplayAdapter;

mod sysdefault;
use sysdefault::SystemDefault;
