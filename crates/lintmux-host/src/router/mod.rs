//! Correlated request fan-out across execution contexts.
//!
//! The router turns "ask every relevant extension the same question" into
//! one resolvable result. Each fan-out gets a correlation id from a
//! monotonic counter; the addressed extensions are tracked as pending
//! until each one answers, reports an error, or fails. An individual
//! failure never fails the fan-out: it degrades that extension's
//! contribution to a recorded failure note, and resolution proceeds once
//! every addressed extension is accounted for.
//!
//! Responses for unknown or abandoned correlation ids, from unaddressed
//! extensions, or after an extension already resolved are discarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use lintmux_protocol::{ExtensionMessage, FileDiagnostics};

use crate::error::ExtensionFailure;

/// Tracing target for router operations.
const ROUTER_TARGET: &str = "lintmux_host::router";

/// The kind of request a fan-out carries; responses must match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `analysisErrorsRequest` → `analysisErrorsResult`.
    AnalysisErrors,
    /// `setConfigRequest` → `setConfigResult`.
    SetConfig,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnalysisErrors => f.write_str("analysisErrors"),
            Self::SetConfig => f.write_str("setConfig"),
        }
    }
}

/// One extension's successful contribution to a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionAnswer {
    extension: String,
    lints: Vec<FileDiagnostics>,
}

impl ExtensionAnswer {
    /// Returns the answering extension's identity.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Returns the reported diagnostics (empty for `setConfig` answers).
    #[must_use]
    pub fn lints(&self) -> &[FileDiagnostics] {
        &self.lints
    }

    /// Consumes the answer, yielding its diagnostics.
    #[must_use]
    pub fn into_lints(self) -> Vec<FileDiagnostics> {
        self.lints
    }
}

/// The resolved outcome of one fan-out.
///
/// Answers are kept in arrival order; the aggregation step relies on that
/// order as its final sort tiebreaker.
#[derive(Debug, Clone, Default)]
pub struct FanoutResult {
    answers: Vec<ExtensionAnswer>,
    failures: Vec<ExtensionFailure>,
}

impl FanoutResult {
    /// Returns the successful answers in arrival order.
    #[must_use]
    pub fn answers(&self) -> &[ExtensionAnswer] {
        &self.answers
    }

    /// Returns the failures recorded against addressed extensions.
    #[must_use]
    pub fn failures(&self) -> &[ExtensionFailure] {
        &self.failures
    }

    /// Splits the result into answers and failures.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ExtensionAnswer>, Vec<ExtensionFailure>) {
        (self.answers, self.failures)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleStatus {
    Pending,
    Answered,
    Failed,
}

#[derive(Debug)]
struct PendingFanout {
    kind: RequestKind,
    statuses: HashMap<String, HandleStatus>,
    remaining: usize,
    answers: Vec<ExtensionAnswer>,
    failures: Vec<ExtensionFailure>,
}

/// Tracks correlated fan-outs until every addressed extension resolves.
#[derive(Debug, Default)]
pub struct RequestRouter {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingFanout>>,
}

impl RequestRouter {
    /// Creates a router whose correlation ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a fan-out of `kind` addressed to `extensions`.
    ///
    /// Returns the correlation id to stamp on the outbound request. A
    /// fan-out addressed to nobody is born resolved.
    pub fn open<I, S>(&self, kind: RequestKind, extensions: I) -> u64
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let statuses: HashMap<String, HandleStatus> = extensions
            .into_iter()
            .map(|name| (name.into(), HandleStatus::Pending))
            .collect();
        let remaining = statuses.len();
        debug!(target: ROUTER_TARGET, id, %kind, addressed = remaining, "opened fan-out");
        self.with_pending(|pending| {
            pending.insert(
                id,
                PendingFanout {
                    kind,
                    statuses,
                    remaining,
                    answers: Vec::new(),
                    failures: Vec::new(),
                },
            );
        });
        id
    }

    /// Records a response message from `extension`.
    ///
    /// The response's correlation id selects the fan-out; its kind is
    /// validated against the request kind. A mismatched kind marks the
    /// extension failed with a protocol note. Messages for unknown ids are
    /// discarded, which is how abandoned fan-outs shed late arrivals.
    pub fn record_response(&self, extension: &str, message: ExtensionMessage) {
        let Some(id) = message.correlation_id() else {
            debug!(
                target: ROUTER_TARGET,
                extension,
                kind = message.kind_name(),
                "discarding uncorrelated message"
            );
            return;
        };
        self.with_pending(|pending| {
            let Some(fanout) = pending.get_mut(&id) else {
                debug!(target: ROUTER_TARGET, extension, id, "discarding late response");
                return;
            };
            let Some(status) = fanout.statuses.get_mut(extension) else {
                debug!(target: ROUTER_TARGET, extension, id, "discarding unaddressed response");
                return;
            };
            if *status != HandleStatus::Pending {
                debug!(target: ROUTER_TARGET, extension, id, "discarding duplicate response");
                return;
            }
            match (fanout.kind, message) {
                (RequestKind::AnalysisErrors, ExtensionMessage::AnalysisErrorsResult { lints, .. }) => {
                    *status = HandleStatus::Answered;
                    fanout.remaining -= 1;
                    fanout.answers.push(ExtensionAnswer {
                        extension: extension.to_owned(),
                        lints,
                    });
                }
                (RequestKind::SetConfig, ExtensionMessage::SetConfigResult { .. }) => {
                    *status = HandleStatus::Answered;
                    fanout.remaining -= 1;
                    fanout.answers.push(ExtensionAnswer {
                        extension: extension.to_owned(),
                        lints: Vec::new(),
                    });
                }
                (_, ExtensionMessage::ErrorResponse { message, .. }) => {
                    *status = HandleStatus::Failed;
                    fanout.remaining -= 1;
                    fanout.failures.push(ExtensionFailure::Reported {
                        name: extension.to_owned(),
                        message,
                    });
                }
                (kind, other) => {
                    warn!(
                        target: ROUTER_TARGET,
                        extension,
                        id,
                        expected = %kind,
                        got = other.kind_name(),
                        "response kind does not match request"
                    );
                    *status = HandleStatus::Failed;
                    fanout.remaining -= 1;
                    fanout.failures.push(ExtensionFailure::Protocol {
                        name: extension.to_owned(),
                        message: format!(
                            "expected a {kind} response, got {}",
                            other.kind_name()
                        ),
                    });
                }
            }
        });
    }

    /// Marks `extension` failed in every fan-out where it is still pending.
    ///
    /// Returns how many fan-outs were affected; zero means the failure was
    /// observed outside any active request and should be recorded for the
    /// next one.
    pub fn record_failure(&self, extension: &str, failure: &ExtensionFailure) -> usize {
        self.with_pending(|pending| {
            let mut affected = 0;
            for fanout in pending.values_mut() {
                if let Some(status) = fanout.statuses.get_mut(extension) {
                    if *status == HandleStatus::Pending {
                        *status = HandleStatus::Failed;
                        fanout.remaining -= 1;
                        fanout.failures.push(failure.clone());
                        affected += 1;
                    }
                }
            }
            affected
        })
    }

    /// Returns `true` once every addressed extension has resolved.
    ///
    /// Unknown ids count as resolved, so a caller looping on this after
    /// [`Self::abandon`] terminates.
    #[must_use]
    pub fn is_resolved(&self, id: u64) -> bool {
        self.with_pending(|pending| pending.get(&id).is_none_or(|fanout| fanout.remaining == 0))
    }

    /// Takes the result of a resolved fan-out.
    ///
    /// Returns `None` while the fan-out is still pending or when the id is
    /// unknown.
    #[must_use]
    pub fn take(&self, id: u64) -> Option<FanoutResult> {
        self.with_pending(|pending| {
            if pending.get(&id)?.remaining > 0 {
                return None;
            }
            pending.remove(&id).map(|fanout| FanoutResult {
                answers: fanout.answers,
                failures: fanout.failures,
            })
        })
    }

    /// Abandons a pending fan-out.
    ///
    /// The router stops waiting; in-flight extension work is not cancelled
    /// and any messages that still arrive for the id are discarded.
    pub fn abandon(&self, id: u64) {
        self.with_pending(|pending| {
            if pending.remove(&id).is_some() {
                debug!(target: ROUTER_TARGET, id, "abandoned fan-out");
            }
        });
    }

    fn with_pending<T>(&self, f: impl FnOnce(&mut HashMap<u64, PendingFanout>) -> T) -> T {
        let mut guard = self
            .pending
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        f(&mut guard)
    }
}
