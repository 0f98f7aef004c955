//! Failure taxonomy for extension supervision.
//!
//! All errors use `thiserror`-derived enums with structured context. The
//! two families are deliberately separate: [`ExtensionFailure`] describes
//! something that went wrong *inside or around an extension* and is
//! recorded, aggregated, and surfaced as meta-diagnostics without ever
//! failing the supervisor; [`ChannelError`] is a local, synchronous error
//! on the send path that the caller can recover from. I/O sources are
//! wrapped in `Arc` so error values stay cheaply cloneable.

use std::sync::Arc;

use thiserror::Error;

/// A recorded failure attributed to one extension.
///
/// Failures never propagate as faults of the supervisor; they degrade the
/// extension's contribution to "no diagnostics, plus this note".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionFailure {
    /// The execution context failed to boot or complete the handshake.
    #[error("extension '{name}' failed to start: {message}")]
    Startup {
        /// Extension identity.
        name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The context exited unexpectedly after having been ready.
    #[error("extension '{name}' crashed: {message}")]
    Crash {
        /// Extension identity.
        name: String,
        /// Human-readable failure description.
        message: String,
        /// Originating source location of the failure, as a
        /// `path:line:col` string, when it could be derived.
        location: Option<String>,
    },

    /// The context sent a message that violates the protocol.
    #[error("extension '{name}' violated the protocol: {message}")]
    Protocol {
        /// Extension identity.
        name: String,
        /// Description of the violation.
        message: String,
    },

    /// A request could not be delivered to the context.
    #[error("extension '{name}' is unreachable: {message}")]
    Unreachable {
        /// Extension identity.
        name: String,
        /// Description of the delivery failure.
        message: String,
    },

    /// The extension answered a request with an explicit error response.
    #[error("extension '{name}' reported an error: {message}")]
    Reported {
        /// Extension identity.
        name: String,
        /// The error text sent by the extension.
        message: String,
    },
}

impl ExtensionFailure {
    /// Returns the identity of the extension the failure is attributed to.
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::Startup { name, .. }
            | Self::Crash { name, .. }
            | Self::Protocol { name, .. }
            | Self::Unreachable { name, .. }
            | Self::Reported { name, .. } => name.as_str(),
        }
    }

    /// Returns the machine-readable code used for meta-diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Startup { .. } => "extension_startup_failure",
            Self::Crash { .. } => "extension_crashed",
            Self::Protocol { .. } => "extension_protocol_error",
            Self::Unreachable { .. } => "extension_channel_closed",
            Self::Reported { .. } => "extension_error",
        }
    }
}

/// Errors raised when sending a message to an execution context.
///
/// These are local to the caller: a closed channel is a no-op candidate
/// (the context has already terminated) and an I/O failure degrades the
/// extension's contribution to the current request.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The handle has already terminated or its stdin was closed.
    #[error("channel to extension '{name}' is closed")]
    Closed {
        /// Extension identity.
        name: String,
    },

    /// The message could not be serialised for the wire.
    #[error("failed to encode message for extension '{name}': {source}")]
    Encode {
        /// Extension identity.
        name: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing to the context's stdin failed.
    #[error("failed to write to extension '{name}': {source}")]
    Io {
        /// Extension identity.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

#[cfg(test)]
mod tests;
