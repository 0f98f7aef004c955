//! Extension manifests: identity plus load locator.
//!
//! A manifest says how to start one extension's execution context: the
//! unique extension name and the command (plus arguments) that boots it.
//! Manifests are serde-derived so the host-facing configuration file can
//! carry them directly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A manifest failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid extension manifest: {message}")]
pub struct ManifestError {
    message: String,
}

impl ManifestError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identity and load locator for one extension.
///
/// # Example
///
/// ```
/// use lintmux_host::ExtensionManifest;
/// use std::path::PathBuf;
///
/// let manifest = ExtensionManifest::new(
///     "unused_imports",
///     PathBuf::from("/usr/local/bin/unused-imports-lint"),
///     vec!["--strict".into()],
/// );
/// assert_eq!(manifest.name(), "unused_imports");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtensionManifest {
    name: String,
    command: PathBuf,
    #[serde(default)]
    args: Vec<String>,
}

impl ExtensionManifest {
    /// Creates a manifest for `name`, started via `command` with `args`.
    #[must_use]
    pub fn new(name: impl Into<String>, command: PathBuf, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command,
            args,
        }
    }

    /// Returns the unique extension name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the command that starts the execution context.
    #[must_use]
    pub fn command(&self) -> &Path {
        self.command.as_path()
    }

    /// Returns the arguments passed to the command.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Validates the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the name is blank or the command is
    /// empty.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::new("extension name must not be blank"));
        }
        if self.command.as_os_str().is_empty() {
            return Err(ManifestError::new(format!(
                "extension '{}' has an empty command",
                self.name
            )));
        }
        Ok(())
    }
}
