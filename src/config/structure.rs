//! Configuration structure
// (c) 2026 Ferry contributors

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use struct_field_names_as_array::FieldNamesAsSlice;

use crate::{
    cli::styles::{info, ColourMode, RESET},
    client::{CollisionPolicy, Priority},
    util::{derive_deftly_template_Optionalify, TimeFormat},
};

use derive_deftly::Deftly;

/// The set of configurable options supported by ferry.
///
/// ### Configuration files
///
/// Configuration files are TOML. Field names are given in `snake_case`, at the top level of the file.
///
/// [More details about the configuration mechanism](crate::config).
///
/// ### Command line
///
/// All configurable options may be used on the command line. There, they must be specified in kebab-case.
///
/// ### Developer notes
/// There is no `default()`.
/// You can access the hard-wired configuration defaults through [`Configuration::system_default()`].
///
/// The [Optionalify](derive_deftly_template_Optionalify) template defines `Configuration_Optional`,
/// which has the same fields wrapped in `Option`. The command line uses that struct, so anything the
/// user does not mention falls through to lower priority sources.
// Maintainer note: None of the members of this struct should be Option<anything>.
#[derive(Deftly)]
#[derive_deftly(Optionalify)]
#[derive(Debug, Clone, PartialEq, Parser, Deserialize, Serialize, FieldNamesAsSlice)]
pub struct Configuration {
    // CONNECTION ======================================================================================
    /// Address the server listens on, and the client connects to
    /// [default: 127.0.0.1]
    #[arg(long, help_heading("Connection"), display_order(0), value_name("host"))]
    pub host: String,

    /// TCP port the server listens on, and the client connects to
    /// [default: 8888]
    ///
    /// A server given port 0 listens on a port chosen by the operating system.
    #[arg(short('p'), long, help_heading("Connection"), display_order(0), value_name("port"))]
    pub port: u16,

    /// How long to wait for the catalog or a size reply, in seconds
    /// [default: 10]
    #[arg(long, help_heading("Connection"), display_order(0), value_name("sec"))]
    pub response_timeout: u16,

    // SERVER ==========================================================================================
    /// Directory tree to serve
    /// [default: list]
    #[arg(long, help_heading("Server"), display_order(0), value_name("dir"))]
    pub root: PathBuf,

    /// Block size used when reading files to send, in bytes
    /// [default: 2048]
    #[arg(long, help_heading("Server"), display_order(0), value_name("bytes"))]
    pub chunk_size: u32,

    /// Maximum number of clients served at the same time; 0 means no limit
    /// [default: 64]
    #[arg(long, help_heading("Server"), display_order(0), value_name("n"))]
    pub max_connections: u32,

    // CLIENT ==========================================================================================
    /// Manifest listing the files to fetch, one per line, each optionally followed by a priority
    /// (`CRITICAL`, `HIGH` or `NORMAL`)
    /// [default: input.txt]
    #[arg(short('m'), long, help_heading("Client"), display_order(0), value_name("file"))]
    pub manifest: PathBuf,

    /// Directory downloaded files are written to
    /// [default: output]
    #[arg(short('o'), long, help_heading("Client"), display_order(0), value_name("dir"))]
    pub output_dir: PathBuf,

    /// What to do when two requested files would be written to the same output file
    /// [default: reject]
    #[arg(long, help_heading("Client"), display_order(0), value_name("policy"))]
    pub collision: CollisionPolicy,

    /// Largest single receive while downloading, in bytes
    /// [default: 4096]
    #[arg(long, help_heading("Client"), display_order(0), value_name("bytes"))]
    pub receive_chunk: u32,

    /// How long to wait for each piece of file data before abandoning the file, in seconds
    /// [default: 5]
    #[arg(long, help_heading("Client"), display_order(0), value_name("sec"))]
    pub chunk_timeout: u16,

    /// Number of times to retry a refused or garbled size request before giving up on the file;
    /// 0 means keep trying forever
    /// [default: 0]
    #[arg(long, help_heading("Client"), display_order(0), value_name("n"))]
    pub max_retries: u32,

    /// Scheduling rank and retry delay for `CRITICAL` files, in seconds
    /// [default: 1]
    #[arg(long, help_heading("Priorities"), display_order(0), value_name("sec"))]
    pub critical_delay: u16,

    /// Scheduling rank and retry delay for `HIGH` files, in seconds
    /// [default: 4]
    #[arg(long, help_heading("Priorities"), display_order(0), value_name("sec"))]
    pub high_delay: u16,

    /// Scheduling rank and retry delay for `NORMAL` files (and files with no priority), in seconds
    /// [default: 10]
    #[arg(long, help_heading("Priorities"), display_order(0), value_name("sec"))]
    pub normal_delay: u16,

    // OUTPUT ==========================================================================================
    /// Specifies the time format to use when printing messages to the console or to file
    /// [default: local]
    #[arg(short = 'T', long, value_name("FORMAT"), help_heading("Output"), display_order(0))]
    pub time_format: TimeFormat,

    /// Colour mode for console output
    /// [default: auto]
    ///
    /// The `CLICOLOR_FORCE` and `NO_COLOR` environment variables are also supported.
    #[arg(
        long,
        alias("colour"),
        default_missing_value("always"), // to support `--color`
        num_args(0..=1),
        value_name("mode"),
        help_heading("Output"),
    )]
    pub color: ColourMode,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    host: "127.0.0.1".into(),
    port: 8888,
    response_timeout: 10,
    root: "list".into(),
    chunk_size: 2048,
    max_connections: 64,
    manifest: "input.txt".into(),
    output_dir: "output".into(),
    collision: CollisionPolicy::Reject,
    receive_chunk: 4096,
    chunk_timeout: 5,
    max_retries: 0,
    critical_delay: 1,
    high_delay: 4,
    normal_delay: 10,
    time_format: TimeFormat::Local,
    color: ColourMode::Auto,
});

fn to_usize(v: u32) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

impl Configuration {
    /// Returns the system default settings
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// The `host:port` pair. IPv6 literals are bracketed.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Accessor for `response_timeout`, as a Duration
    #[must_use]
    pub fn response_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.response_timeout.into())
    }

    /// Accessor for `chunk_timeout`, as a Duration
    #[must_use]
    pub fn chunk_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout.into())
    }

    /// Server read block size
    #[must_use]
    pub fn chunk_size_bytes(&self) -> usize {
        to_usize(self.chunk_size)
    }

    /// Client receive cap
    #[must_use]
    pub fn receive_chunk_bytes(&self) -> usize {
        to_usize(self.receive_chunk)
    }

    /// Retry budget per file, if there is one
    #[must_use]
    pub fn retry_budget(&self) -> Option<u32> {
        match self.max_retries {
            0 => None,
            n => Some(n),
        }
    }

    /// Concurrent connection limit, if there is one
    #[must_use]
    pub fn connection_limit(&self) -> Option<usize> {
        match self.max_connections {
            0 => None,
            n => Some(to_usize(n)),
        }
    }

    /// The delay associated with a priority.
    /// This is both its scheduling rank and its retry interval.
    #[must_use]
    pub fn delay_for(&self, priority: Priority) -> Duration {
        let secs = match priority {
            Priority::Critical => self.critical_delay,
            Priority::High => self.high_delay,
            Priority::Normal => self.normal_delay,
        };
        Duration::from_secs(secs.into())
    }
}

// VALIDATION ------------------------------------------------------------

impl Configuration {
    /// Performs additional validation checks on a configuration object
    pub(crate) fn try_validate(&self) -> Result<()> {
        let info = info();
        if self.host.trim().is_empty() {
            anyhow::bail!("The {info}host{RESET} must not be empty");
        }
        for (name, value) in [
            ("chunk-size", self.chunk_size),
            ("receive-chunk", self.receive_chunk),
        ] {
            if value == 0 {
                anyhow::bail!("The {info}{name}{RESET} must be at least 1 byte");
            }
        }
        for (name, value) in [
            ("chunk-timeout", self.chunk_timeout),
            ("response-timeout", self.response_timeout),
        ] {
            if value == 0 {
                anyhow::bail!("The {info}{name}{RESET} must be at least 1 second");
            }
        }
        if !(self.critical_delay <= self.high_delay && self.high_delay <= self.normal_delay) {
            anyhow::bail!(
                "Priority delays must be ordered {info}critical-delay{RESET} <= {info}high-delay{RESET} <= {info}normal-delay{RESET} (got {}, {}, {})",
                self.critical_delay,
                self.high_delay,
                self.normal_delay,
            );
        }
        Ok(())
    }

    /// Performs additional validation checks on the configuration.
    pub(crate) fn validate(self) -> Result<Self> {
        self.try_validate()?;
        Ok(self)
    }
}
