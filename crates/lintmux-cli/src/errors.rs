//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use lintmux_host::RegistryError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to read configuration file {path}: {source}")]
    LoadConfiguration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration file {path} is not valid: {source}")]
    ParseConfiguration {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid --plugin value '{raw}': {message}")]
    InvalidPlugin { raw: String, message: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to write the report: {0}")]
    WriteReport(#[source] io::Error),
}
