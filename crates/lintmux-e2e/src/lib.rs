//! End-to-end test infrastructure for the lintmux workspace.
//!
//! The tests in this crate drive the real [`PluginSupervisor`] and the
//! `lintmux` binary against live `lintmux-stub` extension processes, so
//! the whole path from spawn and handshake through aggregation and
//! shutdown is exercised without fakes. This module holds the shared
//! plumbing: an in-memory relay sink and manifest builders for stub
//! invocations.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lintmux_host::{ExtensionManifest, ExtensionRegistry, PluginSupervisor};

/// An in-memory, cloneable sink capturing relayed extension output.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far as UTF-8 text.
    #[must_use]
    pub fn contents(&self) -> String {
        let guard = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        String::from_utf8_lossy(&guard).into_owned()
    }

    /// Returns the captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Builds a manifest invoking the stub binary at `stub` with `flags`,
/// announcing `name` in its handshake.
#[must_use]
pub fn stub_manifest(name: &str, stub: &Path, flags: &[&str]) -> ExtensionManifest {
    let mut args = vec!["--name".to_owned(), name.to_owned()];
    args.extend(flags.iter().map(|flag| (*flag).to_owned()));
    ExtensionManifest::new(name, stub.to_path_buf(), args)
}

/// Builds a supervisor over `manifests`, relaying into `sink`.
///
/// # Panics
///
/// Panics when two manifests share a name; tests configure each stub with
/// a unique one.
#[must_use]
pub fn supervisor_over(manifests: Vec<ExtensionManifest>, sink: &CaptureSink) -> PluginSupervisor {
    let mut registry = ExtensionRegistry::new();
    for manifest in manifests {
        registry
            .register(manifest)
            .unwrap_or_else(|err| panic!("manifest registration failed: {err}"));
    }
    PluginSupervisor::new(registry, Box::new(sink.clone()))
}
