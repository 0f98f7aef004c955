//! Wire protocol shared by the lintmux host and its lint extensions.
//!
//! The protocol is a JSONL exchange over child-process stdio: each message
//! is one `kind`-tagged JSON object terminated by a newline. The host writes
//! [`HostMessage`] lines to the extension's stdin; the extension writes
//! [`ExtensionMessage`] lines to stdout, beginning with a single
//! [`ExtensionMessage::Handshake`] that announces its protocol version.
//!
//! Requests carry a correlation id assigned by the host; responses echo it.
//! Notifications (`printNotification`, `shutdownNotification`) carry no id
//! and are never correlated to a request.
//!
//! This crate is dependency-light on purpose: extensions written in Rust
//! link it directly, so it contains only the message types, the diagnostic
//! model, and the line codec.

pub mod codec;
pub mod diagnostic;
pub mod message;

pub use self::codec::CodecError;
pub use self::diagnostic::{Category, DiagnosticRecord, FileDiagnostics, Severity};
pub use self::message::{
    AnalysisConfig, ExtensionMessage, HostMessage, PROTOCOL_VERSION,
};
