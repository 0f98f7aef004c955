//! JSONL line codec for protocol messages.
//!
//! One message per line: serialise, append `\n`, flush. Decoding rejects
//! malformed payloads and unknown message kinds outright; the host treats a
//! rejected line as a protocol violation by the extension, never as data to
//! coerce.

use std::io::Write;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised by the line codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message could not be serialised to JSON.
    #[error("failed to serialise message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The line is not a well-formed message of the expected type.
    #[error("malformed message line: {0}")]
    Decode(#[source] serde_json::Error),

    /// Writing the encoded line failed.
    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes a message as a single JSON line, without the trailing newline.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode_line<M: Serialize>(message: &M) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}

/// Writes one message as a newline-terminated JSON line and flushes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails and
/// [`CodecError::Io`] if the write or flush fails.
pub fn write_line<W: Write, M: Serialize>(writer: &mut W, message: &M) -> Result<(), CodecError> {
    let line = encode_line(message)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Decodes one line into a message of type `M`.
///
/// Leading and trailing whitespace (including the line terminator) is
/// ignored. Unknown `kind` tags and type mismatches are decode errors.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the line does not parse as `M`.
pub fn decode_line<M: DeserializeOwned>(line: &str) -> Result<M, CodecError> {
    serde_json::from_str(line.trim()).map_err(CodecError::Decode)
}
