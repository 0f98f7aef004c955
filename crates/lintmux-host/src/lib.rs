//! Plugin orchestration and protocol multiplexing for lint extensions.
//!
//! `lintmux-host` makes an arbitrary number of independently-authored lint
//! extensions, each running in its own isolated child process, look like
//! one well-behaved plugin to a host analysis service. The supervisor
//! spawns one execution context per extension, fans analysis requests out
//! under correlation ids, merges the returned diagnostics into one
//! deterministically ordered list, and contains every extension failure:
//! a crash degrades that extension's contribution to a recorded failure
//! note instead of failing the run.
//!
//! Side-channel output (print-style emissions, crash tracebacks) flows
//! through an [`OutputRelay`] that tags every line with the owning
//! extension's identity, independently of the request path.
//!
//! # Example
//!
//! ```no_run
//! use lintmux_host::{ExtensionManifest, ExtensionRegistry, PluginSupervisor};
//! use lintmux_protocol::AnalysisConfig;
//! use std::path::PathBuf;
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register(ExtensionManifest::new(
//!     "unused_imports",
//!     PathBuf::from("/usr/local/bin/unused-imports-lint"),
//!     Vec::new(),
//! ))?;
//!
//! let mut supervisor = PluginSupervisor::new(registry, Box::new(std::io::stderr()));
//! supervisor.start();
//! supervisor.configure(AnalysisConfig { include_built_in_lints: true });
//! let report = supervisor.analyze_files(&["lib/main.dart".into()]);
//! let _findings = report.diagnostics().len();
//! supervisor.shutdown();
//! # Ok::<(), lintmux_host::RegistryError>(())
//! ```

pub mod aggregate;
pub mod context;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod relay;
pub mod router;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub use self::context::{ContextEvent, ContextHandle, ContextState};
pub use self::error::{ChannelError, ExtensionFailure};
pub use self::manifest::{ExtensionManifest, ManifestError};
pub use self::registry::{ExtensionRegistry, RegistryError};
pub use self::relay::{OutputEvent, OutputRelay, RelayHandle};
pub use self::router::{ExtensionAnswer, FanoutResult, RequestKind, RequestRouter};
pub use self::supervisor::{AnalysisReport, PluginSupervisor};
