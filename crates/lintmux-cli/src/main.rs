//! CLI entrypoint for the lintmux extension host.
//!
//! The binary delegates to [`lintmux_cli::run`], which parses arguments,
//! loads the extension configuration, starts the supervisor, analyzes the
//! given paths, and renders the merged report.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    lintmux_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
