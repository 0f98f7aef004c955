//! Execution context handles: one isolated child process per extension.
//!
//! A [`ContextHandle`] owns the whole lifecycle of one extension attempt:
//! spawn with piped stdio, the protocol handshake under a bounded timeout,
//! the stdout reader thread that decodes protocol messages, the stderr
//! reader thread that captures raw output, and idempotent termination with
//! a grace period before a forced kill.
//!
//! The stdout stream is the protocol channel. Decoded `print`
//! notifications route straight to the output relay; correlated responses
//! and lifecycle transitions are delivered to the supervisor as
//! [`ContextEvent`]s over a shared fan-in channel. The stderr stream is
//! raw side-channel output: every line is relayed immediately and the
//! most recent lines are retained for crash attribution.
//!
//! Exit classification: an exit is clean iff shutdown was requested via
//! [`ContextHandle::terminate`]. Any unsolicited exit is a crash, even
//! with status zero: an extension that quits mid-session has abandoned
//! its pending work. On a crash the handle emits exactly one
//! `uncaught-failure` relay event, after the stderr reader has been
//! joined, so output produced just before the crash is always relayed
//! first, and then exactly one exit event to the supervisor.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, BufWriter};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use lintmux_protocol::codec::{self, CodecError};
use lintmux_protocol::{ExtensionMessage, HostMessage, PROTOCOL_VERSION};

use crate::error::{ChannelError, ExtensionFailure};
use crate::manifest::ExtensionManifest;
use crate::relay::RelayHandle;

/// Tracing target for context operations.
const CONTEXT_TARGET: &str = "lintmux_host::context";

/// Bounded wait for the extension's handshake after spawn.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace period between requesting shutdown and killing the process.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Poll interval while waiting for the process to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of recent stderr lines retained for crash attribution.
const STDERR_TAIL_LINES: usize = 50;

/// Lifecycle state of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Spawned, handshake not yet complete.
    Starting,
    /// Handshake complete, no request routed yet.
    Ready,
    /// At least one request has been routed.
    Active,
    /// Exited after shutdown was requested.
    TerminatedClean,
    /// Exited without shutdown having been requested.
    TerminatedCrashed,
}

/// Lifecycle and protocol events delivered to the supervisor.
#[derive(Debug)]
pub enum ContextEvent {
    /// A correlated response message arrived.
    Response {
        /// Originating extension identity.
        extension: String,
        /// The decoded response.
        message: ExtensionMessage,
    },
    /// The context sent something that violates the protocol. The handle
    /// has already initiated its own termination.
    ProtocolViolation {
        /// Originating extension identity.
        extension: String,
        /// Description of the violation.
        message: String,
    },
    /// The context exited. `failure` is `None` for a requested shutdown
    /// and carries the crash record otherwise.
    Exited {
        /// Originating extension identity.
        extension: String,
        /// The crash record, when the exit was unsolicited.
        failure: Option<ExtensionFailure>,
    },
}

/// Handle to one extension's isolated execution context.
pub struct ContextHandle {
    name: String,
    child: Mutex<Child>,
    stdin: Mutex<Option<BufWriter<ChildStdin>>>,
    state: Mutex<ContextState>,
    shutdown_requested: AtomicBool,
    stderr_tail: Mutex<VecDeque<String>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ContextHandle {
    /// Spawns the extension's execution context and completes the
    /// handshake.
    ///
    /// Protocol responses and lifecycle events are delivered over
    /// `events`; side-channel output goes to `relay`. The call blocks
    /// until the extension announces a compatible protocol version or the
    /// handshake deadline passes.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionFailure::Startup`] when the process cannot be
    /// spawned, exits before the handshake, announces an incompatible
    /// version, or stays silent past the timeout. The child is killed on
    /// every failure path; no events are emitted for a context that never
    /// became ready.
    pub fn spawn(
        manifest: &ExtensionManifest,
        events: Sender<ContextEvent>,
        relay: RelayHandle,
    ) -> Result<Arc<Self>, ExtensionFailure> {
        let name = manifest.name().to_owned();
        let mut command = Command::new(manifest.command());
        command
            .args(manifest.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            target: CONTEXT_TARGET,
            extension = name.as_str(),
            command = %manifest.command().display(),
            "spawning execution context"
        );

        let mut child = command.spawn().map_err(|err| ExtensionFailure::Startup {
            name: name.clone(),
            message: format!("failed to spawn {}: {err}", manifest.command().display()),
        })?;

        let stdio = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (Some(stdin), Some(stdout), Some(stderr)) = stdio else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExtensionFailure::Startup {
                name,
                message: "failed to capture stdio pipes".to_owned(),
            });
        };

        let handle = Arc::new(Self {
            name: name.clone(),
            child: Mutex::new(child),
            stdin: Mutex::new(Some(BufWriter::new(stdin))),
            state: Mutex::new(ContextState::Starting),
            shutdown_requested: AtomicBool::new(false),
            stderr_tail: Mutex::new(VecDeque::new()),
            reader: Mutex::new(None),
        });

        let stderr_worker = {
            let handle = Arc::clone(&handle);
            let relay = relay.clone();
            spawn_worker(&format!("lintmux-stderr-{name}"), move || {
                handle.pump_stderr(stderr, &relay);
            })
        };
        let Some(stderr_worker) = stderr_worker else {
            handle.kill_now();
            return Err(ExtensionFailure::Startup {
                name,
                message: "failed to spawn stderr reader thread".to_owned(),
            });
        };

        let (handshake_tx, handshake_rx) = mpsc::sync_channel::<Result<(), String>>(1);
        let reader_worker = {
            let handle = Arc::clone(&handle);
            spawn_worker(&format!("lintmux-reader-{name}"), move || {
                handle.pump_stdout(stdout, stderr_worker, &events, &relay, &handshake_tx);
            })
        };
        let Some(reader_worker) = reader_worker else {
            handle.kill_now();
            return Err(ExtensionFailure::Startup {
                name,
                message: "failed to spawn stdout reader thread".to_owned(),
            });
        };

        match handshake_rx.recv_timeout(HANDSHAKE_TIMEOUT) {
            Ok(Ok(())) => {
                handle.set_state(ContextState::Ready);
                *handle.lock_reader() = Some(reader_worker);
                debug!(target: CONTEXT_TARGET, extension = name.as_str(), "context ready");
                Ok(handle)
            }
            Ok(Err(message)) => {
                handle.kill_now();
                let _ = reader_worker.join();
                Err(ExtensionFailure::Startup { name, message })
            }
            Err(RecvTimeoutError::Timeout) => {
                handle.kill_now();
                let _ = reader_worker.join();
                Err(ExtensionFailure::Startup {
                    name,
                    message: format!(
                        "no handshake within {}s",
                        HANDSHAKE_TIMEOUT.as_secs()
                    ),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                handle.kill_now();
                let _ = reader_worker.join();
                Err(ExtensionFailure::Startup {
                    name,
                    message: "reader stopped before the handshake completed".to_owned(),
                })
            }
        }
    }

    /// Returns the extension identity this handle belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ContextState {
        *self.lock_state()
    }

    /// Returns `true` while the context can receive requests.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.state(), ContextState::Ready | ContextState::Active)
    }

    /// Enqueues one message for delivery to the extension.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the handle has terminated or
    /// its stdin has been closed, and [`ChannelError::Io`] when the write
    /// fails (typically because the process died mid-write).
    pub fn send(&self, message: &HostMessage) -> Result<(), ChannelError> {
        {
            let mut guard = self.lock_stdin();
            let Some(writer) = guard.as_mut() else {
                return Err(ChannelError::Closed {
                    name: self.name.clone(),
                });
            };
            codec::write_line(writer, message).map_err(|err| match err {
                CodecError::Encode(source) | CodecError::Decode(source) => ChannelError::Encode {
                    name: self.name.clone(),
                    source,
                },
                CodecError::Io(source) => ChannelError::Io {
                    name: self.name.clone(),
                    source: Arc::new(source),
                },
            })?;
        }
        if message.correlation_id().is_some() {
            let mut state = self.lock_state();
            if *state == ContextState::Ready {
                *state = ContextState::Active;
            }
        }
        Ok(())
    }

    /// Requests shutdown, then kills the process if it outlives the grace
    /// period. Idempotent.
    pub fn terminate(&self) {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(
            target: CONTEXT_TARGET,
            extension = self.name.as_str(),
            "requesting shutdown"
        );
        let _ = self.send(&HostMessage::ShutdownNotification);
        // Closing stdin gives the extension an EOF even if it ignores the
        // shutdown notification.
        *self.lock_stdin() = None;

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            let waited = self.lock_child().try_wait();
            match waited {
                Ok(Some(status)) => {
                    debug!(
                        target: CONTEXT_TARGET,
                        extension = self.name.as_str(),
                        ?status,
                        "extension exited"
                    );
                    break;
                }
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        target: CONTEXT_TARGET,
                        extension = self.name.as_str(),
                        "extension did not exit within the grace period, killing"
                    );
                    self.kill_now();
                    break;
                }
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                Err(error) => {
                    warn!(
                        target: CONTEXT_TARGET,
                        extension = self.name.as_str(),
                        %error,
                        "failed to check extension status, killing"
                    );
                    self.kill_now();
                    break;
                }
            }
        }
    }

    /// Waits until the context's reader thread has drained and emitted
    /// its exit event. Call after [`Self::terminate`] for a deterministic
    /// teardown.
    pub fn join(&self) {
        let worker = self.lock_reader().take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }

    fn pump_stdout(
        &self,
        stdout: ChildStdout,
        stderr_worker: JoinHandle<()>,
        events: &Sender<ContextEvent>,
        relay: &RelayHandle,
        handshake_tx: &SyncSender<Result<(), String>>,
    ) {
        let mut reader = BufReader::new(stdout);
        if let Err(message) = self.await_handshake(&mut reader) {
            let _ = handshake_tx.send(Err(message));
            // spawn() kills the child; stderr drains to EOF.
            let _ = stderr_worker.join();
            return;
        }
        let _ = handshake_tx.send(Ok(()));

        self.pump_messages(&mut reader, events, relay);

        // Join stderr first so everything the extension managed to write
        // is relayed before the crash block and the exit event.
        let _ = stderr_worker.join();
        self.finish(events, relay);
    }

    fn await_handshake(&self, reader: &mut BufReader<ChildStdout>) -> Result<(), String> {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => Err("exited before completing the handshake".to_owned()),
            Err(err) => Err(format!("failed reading handshake: {err}")),
            Ok(_) => match codec::decode_line::<ExtensionMessage>(&line) {
                Ok(ExtensionMessage::Handshake {
                    protocol_version,
                    name,
                }) => {
                    if protocol_version == PROTOCOL_VERSION {
                        debug!(
                            target: CONTEXT_TARGET,
                            extension = self.name.as_str(),
                            announced = name.as_str(),
                            "handshake complete"
                        );
                        Ok(())
                    } else {
                        Err(format!(
                            "unsupported protocol version {protocol_version} (host speaks {PROTOCOL_VERSION})"
                        ))
                    }
                }
                Ok(other) => Err(format!("expected a handshake, got {}", other.kind_name())),
                Err(err) => Err(format!("malformed handshake: {err}")),
            },
        }
    }

    fn pump_messages(
        &self,
        reader: &mut BufReader<ChildStdout>,
        events: &Sender<ContextEvent>,
        relay: &RelayHandle,
    ) {
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Err(error) => {
                    debug!(
                        target: CONTEXT_TARGET,
                        extension = self.name.as_str(),
                        %error,
                        "protocol stream read failed"
                    );
                    break;
                }
                Ok(_) => {}
            }
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode_line::<ExtensionMessage>(&line) {
                Ok(ExtensionMessage::PrintNotification { message }) => {
                    relay.printed(&self.name, &message);
                }
                Ok(ExtensionMessage::Handshake { .. }) => {
                    self.report_violation(events, "unexpected second handshake".to_owned());
                    break;
                }
                Ok(message) => {
                    let _ = events.send(ContextEvent::Response {
                        extension: self.name.clone(),
                        message,
                    });
                }
                Err(err) => {
                    self.report_violation(events, err.to_string());
                    break;
                }
            }
        }
    }

    /// Reports a protocol violation and initiates this handle's own
    /// termination so the violating process cannot keep the wire busy.
    fn report_violation(&self, events: &Sender<ContextEvent>, message: String) {
        warn!(
            target: CONTEXT_TARGET,
            extension = self.name.as_str(),
            message = message.as_str(),
            "protocol violation"
        );
        let _ = events.send(ContextEvent::ProtocolViolation {
            extension: self.name.clone(),
            message,
        });
        self.terminate();
    }

    fn finish(&self, events: &Sender<ContextEvent>, relay: &RelayHandle) {
        let status = self.await_exit();
        if self.shutdown_requested.load(Ordering::SeqCst) {
            self.set_state(ContextState::TerminatedClean);
            let _ = events.send(ContextEvent::Exited {
                extension: self.name.clone(),
                failure: None,
            });
            return;
        }

        self.set_state(ContextState::TerminatedCrashed);
        let tail: Vec<String> = {
            let guard = self.lock_stderr_tail();
            guard.iter().cloned().collect()
        };
        let status_text = describe_status(status);
        let message = tail
            .iter()
            .rev()
            .find(|line| !line.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| status_text.clone());
        let location = derive_location(&tail);
        let block = if tail.is_empty() {
            status_text
        } else {
            tail.join("\n")
        };
        warn!(
            target: CONTEXT_TARGET,
            extension = self.name.as_str(),
            message = message.as_str(),
            "execution context crashed"
        );
        relay.uncaught_failure(&self.name, &block);
        let _ = events.send(ContextEvent::Exited {
            extension: self.name.clone(),
            failure: Some(ExtensionFailure::Crash {
                name: self.name.clone(),
                message,
                location,
            }),
        });
    }

    fn pump_stderr(&self, stderr: ChildStderr, relay: &RelayHandle) {
        let reader = BufReader::new(stderr);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            {
                let mut tail = self.lock_stderr_tail();
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.clone());
            }
            relay.printed(&self.name, &line);
        }
    }

    fn await_exit(&self) -> Option<ExitStatus> {
        loop {
            let waited = self.lock_child().try_wait();
            match waited {
                Ok(Some(status)) => return Some(status),
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                Err(error) => {
                    warn!(
                        target: CONTEXT_TARGET,
                        extension = self.name.as_str(),
                        %error,
                        "failed to await extension exit"
                    );
                    return None;
                }
            }
        }
    }

    fn kill_now(&self) {
        let mut child = self.lock_child();
        let _ = child.kill();
        let _ = child.wait();
    }

    fn set_state(&self, state: ContextState) {
        *self.lock_state() = state;
    }

    fn lock_child(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_stdin(&self) -> MutexGuard<'_, Option<BufWriter<ChildStdin>>> {
        self.stdin.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_stderr_tail(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.stderr_tail
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_reader(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.reader
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        if !self.shutdown_requested.load(Ordering::SeqCst) {
            self.kill_now();
        }
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn spawn_worker<F>(name: &str, f: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_owned()).spawn(f).ok()
}

fn describe_status(status: Option<ExitStatus>) -> String {
    status.map_or_else(
        || "terminated unexpectedly".to_owned(),
        |status| format!("terminated unexpectedly ({status})"),
    )
}

/// Derives a `path:line:col` location from the last non-empty traceback
/// line, when it carries one.
fn derive_location(tail: &[String]) -> Option<String> {
    let line = tail.iter().rev().find(|line| !line.trim().is_empty())?;
    let mut parts = line.trim().splitn(4, ':');
    let path = parts.next()?;
    let line_no = parts.next()?;
    let col_no = parts.next()?;
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if path.is_empty() || !numeric(line_no) || !numeric(col_no) {
        return None;
    }
    Some(format!("{path}:{line_no}:{col_no}"))
}
