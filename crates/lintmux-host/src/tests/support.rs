//! Shared helpers for host tests.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::manifest::ExtensionManifest;

/// An in-memory, cloneable sink capturing relayed output.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far as UTF-8 text.
    pub(crate) fn contents(&self) -> String {
        let guard = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        String::from_utf8_lossy(&guard).into_owned()
    }

    /// Returns the captured output split into lines.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Builds a manifest running `script` under `/bin/sh -c`.
#[cfg(unix)]
pub(crate) fn sh_extension(name: &str, script: &str) -> ExtensionManifest {
    ExtensionManifest::new(
        name,
        PathBuf::from("/bin/sh"),
        vec!["-c".to_owned(), script.to_owned()],
    )
}

/// Shell line announcing a well-formed handshake for `name`.
#[cfg(unix)]
pub(crate) fn handshake_line(name: &str) -> String {
    format!(
        "printf '{{\"kind\":\"handshake\",\"protocolVersion\":1,\"name\":\"{name}\"}}\\n'"
    )
}

/// Shell script for a compliant extension that answers every request.
///
/// `lints_json` is the JSON array used as the `lints` field of every
/// analysis response.
#[cfg(unix)]
pub(crate) fn echo_extension_script(name: &str, lints_json: &str) -> String {
    format!(
        r#"{handshake}
while read -r line; do
  id=$(printf '%s' "$line" | sed 's/.*"id":\([0-9]*\).*/\1/')
  case "$line" in
    *analysisErrorsRequest*) printf '{{"kind":"analysisErrorsResult","id":%s,"lints":{lints_json}}}\n' "$id";;
    *setConfigRequest*) printf '{{"kind":"setConfigResult","id":%s}}\n' "$id";;
    *shutdownNotification*) exit 0;;
  esac
done"#,
        handshake = handshake_line(name),
    )
}
