//! Log output setup
// (c) 2026 Ferry contributors

use std::{
    fs::File,
    io::Write,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    sync::{Arc, Mutex},
};

use anyhow::Context as _;
use indicatif::MultiProgress;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt::{
        time::{ChronoLocal, ChronoUtc},
        MakeWriter,
    },
    prelude::*,
    EnvFilter,
};

use crate::cli::styles::maybe_strip_color;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRIENDLY_FORMAT_LOCAL: &str = "%Y-%m-%d %H:%M:%SL";
const FRIENDLY_FORMAT_UTC: &str = "%Y-%m-%d %H:%M:%SZ";

/// Environment variable that controls what gets logged to the console
const STANDARD_ENV_VAR: &str = "RUST_LOG";
/// Environment variable that controls what gets logged to file
const LOG_FILE_DETAIL_ENV_VAR: &str = "RUST_LOG_FILE_DETAIL";

type BoxedLayer = Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Selects the format of time stamps in log messages
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Local time, as "year-month-day HH:MM:SS"
    #[default]
    Local,
    /// UTC time, as "year-month-day HH:MM:SS"
    Utc,
    /// Local time with offset, in the format described in [RFC 3339](https://datatracker.ietf.org/doc/html/rfc3339).
    Rfc3339,
}

/// Where console log output goes
#[derive(Debug, Clone)]
pub(crate) enum ConsoleTraceType {
    /// Directly to stderr
    Standard,
    /// Through a progress display, so log lines do not tear the bars
    Indicatif(MultiProgress),
    /// Nowhere
    #[allow(dead_code)] // used by tests
    None,
}

/// Everything [`setup`] needs to know
#[derive(Debug, Clone)]
pub(crate) struct LogOptions<'a> {
    /// Default level for our own events, when `RUST_LOG` is not set
    pub(crate) level: &'a str,
    /// Optional file which receives a copy of the log
    pub(crate) file: Option<&'a Path>,
    /// Time stamp style
    pub(crate) time_format: TimeFormat,
    /// Whether console output may contain ANSI colour codes
    pub(crate) ansi: bool,
}

/// Result type for `filter_for()`
struct FilterResult {
    filter: EnvFilter,
    from_env: bool,
}

/// Uses the given environment variable if set, otherwise logs only ferry events at the given level.
fn filter_for(level: &str, key: &str) -> anyhow::Result<FilterResult> {
    match EnvFilter::try_from_env(key) {
        Ok(filter) => Ok(FilterResult {
            filter,
            from_env: true,
        }),
        Err(e) if std::env::var(key).is_ok() => {
            anyhow::bail!("{key} (set in environment) was not understood: {e}")
        }
        Err(_) => Ok(FilterResult {
            filter: EnvFilter::try_new(format!("ferry={level}"))?,
            from_env: false,
        }),
    }
}

fn make_layer<W>(
    writer: W,
    filter: FilterResult,
    time_format: TimeFormat,
    ansi: bool,
) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + 'static + Sync + Send,
{
    // If we are only logging our own events, the target adds nothing
    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(filter.from_env)
        .with_ansi(ansi);

    // The timer must be added before the writer and filter
    match time_format {
        TimeFormat::Local => layer
            .with_timer(ChronoLocal::new(FRIENDLY_FORMAT_LOCAL.into()))
            .with_writer(writer)
            .with_filter(filter.filter)
            .boxed(),
        TimeFormat::Utc => layer
            .with_timer(ChronoUtc::new(FRIENDLY_FORMAT_UTC.into()))
            .with_writer(writer)
            .with_filter(filter.filter)
            .boxed(),
        TimeFormat::Rfc3339 => layer
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(writer)
            .with_filter(filter.filter)
            .boxed(),
    }
}

fn build_layers(
    options: &LogOptions<'_>,
    console: ConsoleTraceType,
) -> anyhow::Result<Vec<BoxedLayer>> {
    let mut layers = Vec::new();

    match console {
        ConsoleTraceType::None => (),
        ConsoleTraceType::Standard => layers.push(make_layer(
            std::io::stderr,
            filter_for(options.level, STANDARD_ENV_VAR)?,
            options.time_format,
            options.ansi,
        )),
        ConsoleTraceType::Indicatif(mp) => layers.push(make_layer(
            ProgressWriter::wrap(mp),
            filter_for(options.level, STANDARD_ENV_VAR)?,
            options.time_format,
            options.ansi,
        )),
    }

    if let Some(path) = options.file {
        let out_file = Arc::new(
            File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?,
        );
        let filter = if std::env::var(LOG_FILE_DETAIL_ENV_VAR).is_ok() {
            FilterResult {
                filter: EnvFilter::try_from_env(LOG_FILE_DETAIL_ENV_VAR)?,
                from_env: true,
            }
        } else {
            filter_for(options.level, STANDARD_ENV_VAR)?
        };
        layers.push(make_layer(out_file, filter, options.time_format, false));
    }
    Ok(layers)
}

/// Sets up tracing to the console and, optionally, to a file.
///
/// By default we log only our own events at the requested level.
/// `RUST_LOG` overrides the console filter; `RUST_LOG_FILE_DETAIL` overrides the file filter.
///
/// **NOTE:** This only takes effect once per process. A second call is ignored with a warning.
pub(crate) fn setup(options: &LogOptions<'_>, console: ConsoleTraceType) -> anyhow::Result<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::Relaxed) {
        tracing::warn!("tracing setup called a second time (ignoring)");
        return Ok(());
    }
    let layers = build_layers(options, console)?;
    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

/// Computes the default log level for a set of client [`Parameters`](crate::client::Parameters)
pub(crate) fn trace_level(params: &crate::client::Parameters) -> &'static str {
    if params.debug {
        "debug"
    } else if params.quiet {
        "error"
    } else {
        "info"
    }
}

/// A wrapper type so tracing can output in a way that doesn't mess up `MultiProgress`
struct ProgressWriter(MultiProgress);

impl ProgressWriter {
    fn wrap(display: MultiProgress) -> Mutex<Self> {
        Mutex::new(Self(display))
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = std::str::from_utf8(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let msg = maybe_strip_color(msg.trim_end());
        if self.0.is_hidden() {
            eprintln!("{msg}");
        } else {
            self.0.println(msg)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
