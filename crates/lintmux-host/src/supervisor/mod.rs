//! Top-level supervision of all extension execution contexts.
//!
//! The [`PluginSupervisor`] owns the registry snapshot, the table of live
//! [`ContextHandle`]s, the [`RequestRouter`], and the [`OutputRelay`], and
//! exposes the mediator's unified surface to the host-facing layer:
//! `start`, `configure`, `analyze_files`, `restart`, `shutdown`.
//!
//! Crash containment is the supervisor's defining property: whether an
//! extension fails at startup or later, the failure degrades only that
//! extension's contribution and is recorded against its identity. Public
//! operations always complete with a best-effort aggregate plus a failure
//! list. Nothing an extension does terminates the supervisor.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, warn};

use lintmux_protocol::{
    AnalysisConfig, Category, DiagnosticRecord, FileDiagnostics, HostMessage, Severity,
};

use crate::aggregate;
use crate::context::{ContextEvent, ContextHandle};
use crate::error::ExtensionFailure;
use crate::registry::ExtensionRegistry;
use crate::router::{ExtensionAnswer, FanoutResult, RequestKind, RequestRouter};
use crate::relay::OutputRelay;

/// Tracing target for supervisor operations.
const SUPERVISOR_TARGET: &str = "lintmux_host::supervisor";

/// The outcome of one `analyze_files` call: merged diagnostics plus the
/// failures encountered while producing them.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    diagnostics: Vec<DiagnosticRecord>,
    failures: Vec<ExtensionFailure>,
}

impl AnalysisReport {
    /// Returns the merged, deterministically ordered diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> &[DiagnosticRecord] {
        &self.diagnostics
    }

    /// Returns the extension failures encountered during the call.
    #[must_use]
    pub fn failures(&self) -> &[ExtensionFailure] {
        &self.failures
    }

    /// Returns `true` when the run should be reported as failed: any
    /// error-severity diagnostic or any extension failure.
    #[must_use]
    pub fn has_blocking_findings(&self) -> bool {
        !self.failures.is_empty() || self.diagnostics.iter().any(DiagnosticRecord::is_error)
    }

    /// Splits the report into diagnostics and failures.
    #[must_use]
    pub fn into_parts(self) -> (Vec<DiagnosticRecord>, Vec<ExtensionFailure>) {
        (self.diagnostics, self.failures)
    }
}

/// Owner of every execution context and of the unified protocol surface.
pub struct PluginSupervisor {
    registry: ExtensionRegistry,
    options: AnalysisConfig,
    contexts: BTreeMap<String, Arc<ContextHandle>>,
    router: RequestRouter,
    relay: OutputRelay,
    events_tx: Sender<ContextEvent>,
    events_rx: Receiver<ContextEvent>,
    recorded_failures: Vec<ExtensionFailure>,
}

impl PluginSupervisor {
    /// Creates a supervisor over `registry`, relaying extension output to
    /// `sink`. No contexts are spawned until [`Self::start`].
    #[must_use]
    pub fn new(registry: ExtensionRegistry, sink: Box<dyn Write + Send>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            registry,
            options: AnalysisConfig::default(),
            contexts: BTreeMap::new(),
            router: RequestRouter::new(),
            relay: OutputRelay::new(sink),
            events_tx,
            events_rx,
            recorded_failures: Vec::new(),
        }
    }

    /// Spawns one execution context per registered extension.
    ///
    /// Startup failures are recorded against the extension's identity and
    /// relayed with its tag; they never abort the remaining spawns.
    pub fn start(&mut self) {
        let names: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        for name in names {
            self.spawn_context(&name);
        }
        debug!(
            target: SUPERVISOR_TARGET,
            live = self.contexts.len(),
            registered = self.registry.len(),
            "supervisor started"
        );
    }

    /// Stores `options` and fans them out to every live context.
    ///
    /// Failures observed during the fan-out are recorded and surface as
    /// meta-diagnostics on the next [`Self::analyze_files`] call.
    pub fn configure(&mut self, options: AnalysisConfig) {
        self.options = options;
        self.drain_idle_events();
        let addressed = self.live_names();
        if addressed.is_empty() {
            return;
        }
        let id = self
            .router
            .open(RequestKind::SetConfig, addressed.iter().cloned());
        for name in &addressed {
            self.send_to(name, &HostMessage::SetConfigRequest { id, config: options });
        }
        let (_acks, failures) = self.collect(id).into_parts();
        self.recorded_failures.extend(failures);
    }

    /// Analyzes `paths` across every live extension and returns the
    /// merged diagnostics plus the failures encountered.
    ///
    /// The call waits for every addressed context's natural resolution
    /// (answer, explicit error, crash) without a blanket timeout; a
    /// slow extension delays the result but never fabricates one. Crashes
    /// observed while idle since the previous call are folded into this
    /// report's failure list.
    pub fn analyze_files(&mut self, paths: &[String]) -> AnalysisReport {
        self.drain_idle_events();
        let addressed = self.live_names();
        let id = self
            .router
            .open(RequestKind::AnalysisErrors, addressed.iter().cloned());
        debug!(
            target: SUPERVISOR_TARGET,
            id,
            addressed = addressed.len(),
            files = paths.len(),
            "analysis fan-out"
        );
        for name in &addressed {
            self.send_to(
                name,
                &HostMessage::AnalysisErrorsRequest {
                    id,
                    files: paths.to_vec(),
                },
            );
        }
        let (answers, run_failures) = self.collect(id).into_parts();

        let mut failures = std::mem::take(&mut self.recorded_failures);
        failures.extend(run_failures);

        let mut batches: Vec<Vec<FileDiagnostics>> = answers
            .into_iter()
            .map(ExtensionAnswer::into_lints)
            .collect();
        if self.options.include_built_in_lints && !failures.is_empty() {
            let anchor = paths.iter().min().cloned().unwrap_or_default();
            let meta: Vec<DiagnosticRecord> = failures
                .iter()
                .map(|failure| meta_diagnostic(failure, &anchor))
                .collect();
            batches.push(vec![FileDiagnostics::new(anchor, meta)]);
        }
        AnalysisReport {
            diagnostics: aggregate::merge_batches(batches),
            failures,
        }
    }

    /// Respawns a previously-failed extension from its manifest.
    ///
    /// A live context is left untouched. Until an extension is restarted
    /// it stays excluded from every fan-out.
    ///
    /// # Errors
    ///
    /// Returns the startup failure when the respawn does not reach the
    /// ready state, or [`ExtensionFailure::Startup`] when the name was
    /// never registered.
    pub fn restart(&mut self, name: &str) -> Result<(), ExtensionFailure> {
        if self.registry.get(name).is_none() {
            return Err(ExtensionFailure::Startup {
                name: name.to_owned(),
                message: "extension is not registered".to_owned(),
            });
        }
        if self.contexts.contains_key(name) {
            return Ok(());
        }
        match self.spawn_context(name) {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }

    /// Terminates every context (bounded per-handle grace period), drains
    /// the relay, and leaves the supervisor empty. Never fails on an
    /// individual handle. Idempotent.
    pub fn shutdown(&mut self) {
        let contexts = std::mem::take(&mut self.contexts);
        for handle in contexts.values() {
            handle.terminate();
        }
        for handle in contexts.values() {
            handle.join();
        }
        drop(contexts);
        self.drain_idle_events();
        self.relay.close();
    }

    /// Returns the names of extensions currently able to receive requests.
    #[must_use]
    pub fn live_names(&self) -> Vec<String> {
        self.contexts
            .iter()
            .filter(|(_, handle)| handle.is_live())
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn spawn_context(&mut self, name: &str) -> Option<ExtensionFailure> {
        let Some(manifest) = self.registry.get(name).cloned() else {
            return Some(ExtensionFailure::Startup {
                name: name.to_owned(),
                message: "extension is not registered".to_owned(),
            });
        };
        let Some(relay_handle) = self.relay.subscribe() else {
            return Some(ExtensionFailure::Startup {
                name: name.to_owned(),
                message: "supervisor is shut down".to_owned(),
            });
        };
        match ContextHandle::spawn(&manifest, self.events_tx.clone(), relay_handle) {
            Ok(handle) => {
                self.contexts.insert(name.to_owned(), handle);
                None
            }
            Err(failure) => {
                warn!(
                    target: SUPERVISOR_TARGET,
                    extension = name,
                    %failure,
                    "extension failed to start"
                );
                self.relay.uncaught_failure(name, &failure.to_string());
                self.recorded_failures.push(failure.clone());
                Some(failure)
            }
        }
    }

    fn send_to(&mut self, name: &str, message: &HostMessage) {
        let failure = match self.contexts.get(name) {
            Some(handle) => match handle.send(message) {
                Ok(()) => return,
                Err(error) => ExtensionFailure::Unreachable {
                    name: name.to_owned(),
                    message: error.to_string(),
                },
            },
            None => ExtensionFailure::Unreachable {
                name: name.to_owned(),
                message: "no live execution context".to_owned(),
            },
        };
        warn!(
            target: SUPERVISOR_TARGET,
            extension = name,
            %failure,
            "request could not be delivered"
        );
        self.router.record_failure(name, &failure);
    }

    /// Pumps the fan-in channel until the fan-out resolves.
    fn collect(&mut self, id: u64) -> FanoutResult {
        while !self.router.is_resolved(id) {
            match self.events_rx.recv() {
                Ok(event) => self.apply_event(event),
                Err(_) => break,
            }
        }
        self.router.take(id).unwrap_or_default()
    }

    /// Applies crash and protocol events observed outside an active
    /// request so they surface on the next call instead of being lost.
    fn drain_idle_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: ContextEvent) {
        match event {
            ContextEvent::Response { extension, message } => {
                self.router.record_response(&extension, message);
            }
            ContextEvent::ProtocolViolation { extension, message } => {
                self.contexts.remove(&extension);
                let failure = ExtensionFailure::Protocol {
                    name: extension.clone(),
                    message,
                };
                if self.router.record_failure(&extension, &failure) == 0 {
                    self.recorded_failures.push(failure);
                }
            }
            ContextEvent::Exited { extension, failure } => {
                self.contexts.remove(&extension);
                if let Some(failure) = failure {
                    if self.router.record_failure(&extension, &failure) == 0 {
                        self.recorded_failures.push(failure);
                    }
                }
            }
        }
    }
}

impl Drop for PluginSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PluginSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSupervisor")
            .field("registered", &self.registry.len())
            .field("live", &self.contexts.len())
            .finish_non_exhaustive()
    }
}

/// Builds the meta-diagnostic the supervisor injects for one failure.
fn meta_diagnostic(failure: &ExtensionFailure, anchor: &str) -> DiagnosticRecord {
    DiagnosticRecord::at_point(
        anchor,
        0,
        0,
        Severity::Error,
        Category::Lint,
        failure.to_string(),
        failure.code(),
    )
}
