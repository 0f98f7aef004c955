//! CLI argument definitions for the lintmux binary.

use std::path::PathBuf;

use clap::Parser;

/// Command-line interface for the lintmux extension host.
#[derive(Debug, Parser)]
#[command(
    name = "lintmux",
    about = "Runs isolated lint extensions over a set of files and merges their diagnostics"
)]
pub(crate) struct Cli {
    /// Paths of the files to analyze.
    #[arg(value_name = "PATH")]
    pub(crate) paths: Vec<String>,

    /// JSON configuration file listing extensions
    /// (defaults to ./lintmux.json when present).
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Additional extension as NAME=COMMAND [ARGS...]; repeatable.
    #[arg(long = "plugin", value_name = "NAME=COMMAND")]
    pub(crate) plugins: Vec<String>,

    /// Disable the supervisor's meta-diagnostics about extension health.
    #[arg(long)]
    pub(crate) no_builtin_lints: bool,

    /// Tracing filter directive (also honours the LINTMUX_LOG variable).
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
}

impl Cli {
    /// Returns true when the invocation names neither paths nor any
    /// extension source, so the runner can emit guidance instead of
    /// silently producing an empty report.
    pub(crate) fn is_bare_invocation(&self) -> bool {
        self.paths.is_empty() && self.config.is_none() && self.plugins.is_empty()
    }
}
