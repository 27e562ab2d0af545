//! Main CLI for ferry
// (c) 2026 Ferry contributors

use std::ffi::OsString;
use std::process::ExitCode;

use anstream::{eprintln, println};
use clap::{error::ErrorKind, Parser as _};
use indicatif::{MultiProgress, ProgressDrawTarget};
use tokio_util::sync::CancellationToken;
use tracing::{error_span, info, Instrument as _};

use super::{
    args::{CliArgs, MainMode},
    styles::{configure_colours, error, use_colours, RESET},
};
use crate::{
    client::{client_main, progress::MAX_UPDATE_FPS, Parameters},
    config::{Configuration, Manager},
    server::Server,
    util::{setup_tracing, trace_level, ConsoleTraceType, LogOptions},
};

/// Main CLI entrypoint
///
/// Call this from `main` with the process arguments.
/// Errors are reported here; the exit code says whether everything asked for was done.
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match cli_inner(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if tracing::dispatcher::has_been_set() {
                tracing::error!("{e:#}");
            } else {
                eprintln!("{}Error:{RESET} {e:#}", error());
            }
            ExitCode::FAILURE
        }
    }
}

fn cli_inner<I, T>(args: I) -> anyhow::Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match CliArgs::try_parse_from(args) {
        Ok(a) => a,
        Err(e) => {
            e.print()?;
            return Ok(matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion));
        }
    };
    let mode = MainMode::from(&args);
    if mode == MainMode::ShowConfigFiles {
        for file in Manager::config_files() {
            println!("{}", file.display());
        }
        return Ok(true);
    }

    // (to provoke an error here: `FERRY_PORT=x ferry`)
    let mut manager = Manager::standard(args.config_file.as_deref());
    manager.merge_provider(args.config.clone());
    manager.apply_system_default();
    let config = manager.validated()?;
    configure_colours(config.color);

    match mode {
        MainMode::ShowConfig => {
            println!("{}", manager.to_display_adapter::<Configuration>());
            Ok(true)
        }
        MainMode::Server => run_server(&config, &args.client_params),
        MainMode::Client => run_client(&config, &args.client_params),
        MainMode::ShowConfigFiles => Ok(true),
    }
}

fn log_options<'a>(config: &Configuration, params: &'a Parameters) -> LogOptions<'a> {
    LogOptions {
        level: trace_level(params),
        file: params.log_file.as_deref(),
        time_format: config.time_format,
        ansi: use_colours(),
    }
}

#[tokio::main]
async fn run_server(config: &Configuration, params: &Parameters) -> anyhow::Result<bool> {
    setup_tracing(&log_options(config, params), ConsoleTraceType::Standard)?; // to provoke error: set RUST_LOG=.
    let server = Server::bind(config).await?;
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; shutting down");
            trigger.cancel();
        }
    });
    server.run(shutdown).instrument(error_span!("SERVER")).await?;
    Ok(true)
}

#[tokio::main]
async fn run_client(config: &Configuration, params: &Parameters) -> anyhow::Result<bool> {
    let target = if params.quiet {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stderr_with_hz(MAX_UPDATE_FPS)
    };
    let display = MultiProgress::with_draw_target(target);
    setup_tracing(
        &log_options(config, params),
        ConsoleTraceType::Indicatif(display.clone()),
    )?;
    client_main(config, params, display).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::cli_inner;

    #[test]
    fn help_and_version_succeed() {
        assert!(cli_inner(["ferry", "--help"]).unwrap());
        assert!(cli_inner(["ferry", "--version"]).unwrap());
    }

    #[test]
    fn bad_arguments_fail() {
        assert!(!cli_inner(["ferry", "--no-such-option"]).unwrap());
    }

    #[test]
    fn config_files() {
        assert!(cli_inner(["ferry", "--config-files"]).unwrap());
    }

    #[test]
    fn invalid_configuration() {
        assert!(cli_inner(["ferry", "--show-config", "--chunk-size", "0"]).is_err());
    }
}
