//! Runtime for the `lintmux` binary.
//!
//! [`run`] is the whole host-facing surface: parse arguments, initialise
//! telemetry, load the extension configuration, start the
//! [`PluginSupervisor`](lintmux_host::PluginSupervisor), analyze the given
//! paths, render the merged report to stdout, and map the outcome to an
//! exit status. Relayed extension output (tagged prints and failure
//! blocks) goes to the process stderr as it is produced.
//!
//! The exit status is non-zero when any error-severity diagnostic or any
//! extension failure occurred, and zero otherwise.

mod cli;
mod config;
mod errors;
mod report;
mod telemetry;

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use lintmux_host::PluginSupervisor;
use lintmux_protocol::AnalysisConfig;

use crate::cli::Cli;
use crate::errors::AppError;

/// Exit status for a clean run.
const EXIT_OK: u8 = 0;
/// Exit status when diagnostics of error severity or extension failures
/// were reported.
const EXIT_FINDINGS: u8 = 1;
/// Exit status for usage and configuration errors.
const EXIT_USAGE: u8 = 2;

/// Runs the CLI with the given arguments and output streams.
///
/// Never panics on extension misbehaviour; every failure path maps to an
/// exit status and a message on `stderr`.
pub fn run<I, T>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{err}");
            return ExitCode::from(EXIT_OK);
        }
        Err(err) => {
            let _ = write!(stderr, "{err}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    match try_run(&cli, stdout, stderr) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(stderr, "lintmux: {error}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn try_run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<ExitCode, AppError> {
    telemetry::initialise(cli.log_filter.as_deref())?;

    if cli.is_bare_invocation() {
        let _ = writeln!(
            stderr,
            "lintmux: nothing to do (no extensions configured, no paths given); try --help"
        );
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let file_config = config::load(cli.config.as_deref())?;
    let registry = config::build_registry(&file_config, &cli.plugins)?;
    let include_built_in_lints = file_config.include_built_in_lints && !cli.no_builtin_lints;

    let mut supervisor = PluginSupervisor::new(registry, Box::new(io::stderr()));
    supervisor.start();
    supervisor.configure(AnalysisConfig {
        include_built_in_lints,
    });

    let report = supervisor.analyze_files(&cli.paths);
    report::render_diagnostics(stdout, report.diagnostics()).map_err(AppError::WriteReport)?;
    supervisor.shutdown();

    Ok(if report.has_blocking_findings() {
        ExitCode::from(EXIT_FINDINGS)
    } else {
        ExitCode::from(EXIT_OK)
    })
}
