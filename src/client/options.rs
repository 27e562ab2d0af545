//! Options specific to client mode
// (c) 2026 Ferry contributors

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone, Default)]
/// Client-side options which may be provided on the command line, but are not persistent configuration options.
pub struct Parameters {
    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=ferry=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, help_heading("Debug"), display_order(0))]
    pub debug: bool,

    /// Quiet mode
    ///
    /// Switches off progress display and statistics; reports only errors
    #[arg(short, long, action, conflicts_with("debug"), help_heading("Output"))]
    pub quiet: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(
        long,
        action,
        value_name("FILE"),
        help_heading("Output"),
        next_line_help(true),
        display_order(0)
    )]
    pub log_file: Option<PathBuf>,

    /// Print the server's catalog and exit without downloading anything
    #[arg(short, long, action, help_heading("Client"), display_order(0))]
    pub list: bool,

    // (POSITIONAL ARGUMENTS!)
    /// Files to fetch at NORMAL priority, instead of reading the manifest
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use clap::Parser as _;

    use super::Parameters;

    #[test]
    fn positional_files() {
        let p = Parameters::try_parse_from(["ferry", "-l", "a.txt", "b/c.txt"]).unwrap();
        assert!(p.list);
        assert_eq!(p.files, ["a.txt", "b/c.txt"]);
    }

    #[test]
    fn quiet_and_debug_conflict() {
        assert!(Parameters::try_parse_from(["ferry", "-q", "-d"]).is_err());
    }
}
