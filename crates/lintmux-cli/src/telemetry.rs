//! Structured telemetry initialisation for the CLI.

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Environment variable consulted when no `--log-filter` is given.
pub(crate) const LOG_ENV_VAR: &str = "LINTMUX_LOG";

/// Filter applied when neither the flag nor the variable is set.
const DEFAULT_FILTER: &str = "warn";

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first
/// time. Repeated calls are idempotent.
///
/// Log output goes to stderr so it interleaves with relayed extension
/// output rather than corrupting the report on stdout.
pub(crate) fn initialise(flag_filter: Option<&str>) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(flag_filter))
        .map(|_guard| ())
}

fn install_subscriber(flag_filter: Option<&str>) -> Result<(), TelemetryError> {
    let directives = flag_filter
        .map(str::to_owned)
        .or_else(|| std::env::var(LOG_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned());
    let filter =
        EnvFilter::try_new(&directives).map_err(|err| TelemetryError::Filter(err.to_string()))?;
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
