//! Command line argument definitions
// (c) 2026 Ferry contributors

use std::path::PathBuf;

use clap::Parser;

use crate::{client::Parameters, config::Configuration_Optional};

// Everything that can be given on the command line
#[derive(Debug, Parser, Clone)]
#[command(
    version,
    about,
    long_about = "Fetches files from a ferry server in priority order, or serves a directory tree to ferry clients.",
    styles = super::styles::CLAP_STYLES,
)]
pub(crate) struct CliArgs {
    // MODE SELECTION ======================================================================
    /// Operates in server mode, offering the files beneath the served directory (see `--root`)
    #[arg(long, action, help_heading("Modes"), display_order(0), conflicts_with_all(["list", "files"]))]
    pub(crate) server: bool,

    /// Outputs the configuration, then exits.
    ///
    /// If a command line option is given, it overrides the corresponding configuration setting.
    #[arg(long, action, help_heading("Configuration"), display_order(0), conflicts_with_all(["server", "config_files"]))]
    pub(crate) show_config: bool,

    /// Outputs the paths to configuration file(s), then exits
    #[arg(long, action, help_heading("Configuration"), display_order(0), conflicts_with("server"))]
    pub(crate) config_files: bool,

    /// Reads an additional configuration file, after the standard ones
    #[arg(long, value_name("FILE"), help_heading("Configuration"), display_order(0))]
    pub(crate) config_file: Option<PathBuf>,

    // CLIENT-SIDE OPTIONS =================================================================
    #[command(flatten)]
    pub(crate) client_params: Parameters,

    // CONFIGURABLE OPTIONS ================================================================
    #[command(flatten)]
    pub(crate) config: Configuration_Optional,
}

/// What the command line asked us to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MainMode {
    Server,
    Client,
    ShowConfig,
    ShowConfigFiles,
}

impl From<&CliArgs> for MainMode {
    fn from(args: &CliArgs) -> Self {
        if args.server {
            MainMode::Server
        } else if args.show_config {
            MainMode::ShowConfig
        } else if args.config_files {
            MainMode::ShowConfigFiles
        } else {
            MainMode::Client
        }
    }
}
