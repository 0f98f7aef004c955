//! Message kinds exchanged between the host and one extension.
//!
//! Both directions use internally tagged JSON objects: the `kind` field
//! selects the variant and the remaining fields are the payload. Unknown
//! kinds are rejected at decode time.

use serde::{Deserialize, Serialize};

use crate::diagnostic::FileDiagnostics;

/// Protocol version announced in the handshake.
///
/// The host refuses to talk to an extension announcing any other version;
/// a mismatch is reported as a startup failure, not negotiated around.
pub const PROTOCOL_VERSION: u32 = 1;

/// Configuration fanned out to every extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Whether the supervisor injects meta-diagnostics about extension
    /// health alongside user diagnostics.
    pub include_built_in_lints: bool,
}

/// Message written by the host to an extension's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    /// Asks the extension to analyze the given files.
    AnalysisErrorsRequest {
        /// Correlation id echoed by the response.
        id: u64,
        /// Paths of the files to analyze.
        files: Vec<String>,
    },
    /// Pushes configuration to the extension.
    SetConfigRequest {
        /// Correlation id echoed by the response.
        id: u64,
        /// The configuration to apply.
        config: AnalysisConfig,
    },
    /// Asks the extension to exit. No reply is expected.
    ShutdownNotification,
}

impl HostMessage {
    /// Returns the correlation id for requests, `None` for notifications.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<u64> {
        match self {
            Self::AnalysisErrorsRequest { id, .. } | Self::SetConfigRequest { id, .. } => Some(*id),
            Self::ShutdownNotification => None,
        }
    }
}

/// Message written by an extension to its stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExtensionMessage {
    /// First message on the wire: announces the extension and its protocol
    /// version so the host can refuse incompatible peers before routing
    /// any work to them.
    Handshake {
        /// Version of this protocol the extension speaks.
        protocol_version: u32,
        /// Self-reported extension name, used for log attribution only;
        /// the host keys everything on the configured manifest name.
        name: String,
    },
    /// Answer to [`HostMessage::AnalysisErrorsRequest`].
    AnalysisErrorsResult {
        /// Correlation id of the request being answered.
        id: u64,
        /// Diagnostics grouped per analyzed file.
        lints: Vec<FileDiagnostics>,
    },
    /// Answer to [`HostMessage::SetConfigRequest`].
    SetConfigResult {
        /// Correlation id of the request being answered.
        id: u64,
    },
    /// Explicit failure answer to any request.
    ErrorResponse {
        /// Correlation id of the request that failed.
        id: u64,
        /// Human-readable failure description.
        message: String,
    },
    /// Fire-and-forget print-style output, never correlated to a request.
    PrintNotification {
        /// The printed text; may contain embedded newlines.
        message: String,
    },
}

impl ExtensionMessage {
    /// Returns the correlation id for responses, `None` otherwise.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<u64> {
        match self {
            Self::AnalysisErrorsResult { id, .. }
            | Self::SetConfigResult { id }
            | Self::ErrorResponse { id, .. } => Some(*id),
            Self::Handshake { .. } | Self::PrintNotification { .. } => None,
        }
    }

    /// Returns the wire name of the message kind, for logging.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Handshake { .. } => "handshake",
            Self::AnalysisErrorsResult { .. } => "analysisErrorsResult",
            Self::SetConfigResult { .. } => "setConfigResult",
            Self::ErrorResponse { .. } => "errorResponse",
            Self::PrintNotification { .. } => "printNotification",
        }
    }
}
