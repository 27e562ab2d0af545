//! General utility code that didn't fit anywhere else
//!
//! Note that most of this module is not exported.
// (c) 2026 Ferry contributors

pub(crate) mod path;

pub(crate) mod stats;
pub use stats::RunStats;

mod tracing;
pub(crate) use tracing::{setup as setup_tracing, trace_level, ConsoleTraceType, LogOptions};
pub use tracing::TimeFormat;

mod optionalify;
pub use optionalify::derive_deftly_template_Optionalify;
