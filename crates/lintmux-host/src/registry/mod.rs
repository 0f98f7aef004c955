//! Registry of configured extensions.
//!
//! The registry is the single supervisor-owned table of extension
//! manifests keyed by name. Registration validates the manifest and
//! rejects duplicate names. Iteration order is the name order, so fan-out
//! and startup sequences are deterministic.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::manifest::{ExtensionManifest, ManifestError};

/// Errors raised while populating the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The manifest failed validation.
    #[error(transparent)]
    Invalid(#[from] ManifestError),

    /// An extension with the same name is already registered.
    #[error("extension '{name}' is already registered")]
    Duplicate {
        /// The conflicting name.
        name: String,
    },
}

/// Table of extension manifests keyed by extension name.
///
/// # Example
///
/// ```
/// use lintmux_host::{ExtensionManifest, ExtensionRegistry};
/// use std::path::PathBuf;
///
/// let mut registry = ExtensionRegistry::new();
/// registry
///     .register(ExtensionManifest::new(
///         "unused_imports",
///         PathBuf::from("/usr/local/bin/unused-imports-lint"),
///         Vec::new(),
///     ))
///     .expect("registration succeeds");
/// assert!(registry.get("unused_imports").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    manifests: BTreeMap<String, ExtensionManifest>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a manifest after validation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] when validation fails and
    /// [`RegistryError::Duplicate`] when the name is already taken.
    pub fn register(&mut self, manifest: ExtensionManifest) -> Result<(), RegistryError> {
        manifest.validate()?;
        let name = manifest.name().to_owned();
        if self.manifests.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.manifests.insert(name, manifest);
        Ok(())
    }

    /// Looks up a manifest by extension name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExtensionManifest> {
        self.manifests.get(name)
    }

    /// Iterates manifests in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionManifest> {
        self.manifests.values()
    }

    /// Returns the registered names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.manifests.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Returns `true` when no extensions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}
