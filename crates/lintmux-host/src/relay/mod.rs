//! Attributed relay of extension side-channel output.
//!
//! Every execution context produces free-form output (print-style
//! emissions and, on a crash, a traceback block) alongside its protocol
//! stream. The relay consumes those events on a dedicated writer thread
//! and forwards them to the host's output stream, prefixing every physical
//! line with the owning extension's bracketed identity.
//!
//! Producers send over an unbounded channel, so a slow output sink never
//! blocks the request path. Events from one extension are relayed in the
//! order produced; events from different extensions may interleave.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::warn;

/// Tracing target for relay operations.
const RELAY_TARGET: &str = "lintmux_host::relay";

/// One unit of side-channel output, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A print-style emission. May contain embedded newlines.
    PrintedLine {
        /// Owning extension identity.
        extension: String,
        /// The printed text.
        text: String,
    },
    /// The traceback block synthesized for a context that terminated
    /// abnormally. Emitted exactly once per crash.
    UncaughtFailure {
        /// Owning extension identity.
        extension: String,
        /// The failure text, usually multiple physical lines.
        text: String,
    },
}

impl OutputEvent {
    /// Returns the identity of the extension the event belongs to.
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::PrintedLine { extension, .. } | Self::UncaughtFailure { extension, .. } => {
                extension.as_str()
            }
        }
    }
}

/// Internal channel message: output, or the close sentinel.
#[derive(Debug)]
enum RelayMessage {
    Event(OutputEvent),
    Shutdown,
}

/// Cheaply cloneable producer side of the relay.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: Sender<RelayMessage>,
}

impl RelayHandle {
    /// Relays a print-style emission from `extension`.
    pub fn printed(&self, extension: &str, text: &str) {
        self.send(OutputEvent::PrintedLine {
            extension: extension.to_owned(),
            text: text.to_owned(),
        });
    }

    /// Relays the one failure block for a crashed `extension`.
    pub fn uncaught_failure(&self, extension: &str, text: &str) {
        self.send(OutputEvent::UncaughtFailure {
            extension: extension.to_owned(),
            text: text.to_owned(),
        });
    }

    fn send(&self, event: OutputEvent) {
        // Events sent after close are consumed by nobody and dropped with
        // the channel; a send itself never blocks or fails the producer.
        let _ = self.tx.send(RelayMessage::Event(event));
    }
}

/// Consumer side of the relay: owns the writer thread.
#[derive(Debug)]
pub struct OutputRelay {
    handle: Option<RelayHandle>,
    worker: Option<JoinHandle<()>>,
}

impl OutputRelay {
    /// Creates a relay writing tagged lines to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("lintmux-relay".to_owned())
            .spawn(move || relay_loop(rx, sink))
            .ok();
        if worker.is_none() {
            warn!(target: RELAY_TARGET, "failed to spawn relay writer thread");
        }
        Self {
            handle: Some(RelayHandle { tx }),
            worker,
        }
    }

    /// Returns a producer handle for an execution context.
    ///
    /// Returns `None` once the relay has been closed.
    #[must_use]
    pub fn subscribe(&self) -> Option<RelayHandle> {
        self.handle.clone()
    }

    /// Relays a print-style emission through the relay's own handle.
    pub fn printed(&self, extension: &str, text: &str) {
        if let Some(handle) = &self.handle {
            handle.printed(extension, text);
        }
    }

    /// Relays a failure block through the relay's own handle.
    pub fn uncaught_failure(&self, extension: &str, text: &str) {
        if let Some(handle) = &self.handle {
            handle.uncaught_failure(extension, text);
        }
    }

    /// Closes the relay and waits for buffered output to drain.
    ///
    /// Everything sent before the close is written; anything a straggling
    /// producer sends afterwards is dropped. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.tx.send(RelayMessage::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for OutputRelay {
    fn drop(&mut self) {
        self.close();
    }
}

fn relay_loop(rx: Receiver<RelayMessage>, mut sink: Box<dyn Write + Send>) {
    while let Ok(message) = rx.recv() {
        let event = match message {
            RelayMessage::Event(event) => event,
            RelayMessage::Shutdown => break,
        };
        let (extension, text) = match &event {
            OutputEvent::PrintedLine { extension, text }
            | OutputEvent::UncaughtFailure { extension, text } => {
                (extension.as_str(), text.as_str())
            }
        };
        for line in physical_lines(text) {
            if let Err(error) = writeln!(sink, "[{extension}] {line}") {
                warn!(target: RELAY_TARGET, %error, "failed to write relayed output");
                return;
            }
        }
        if let Err(error) = sink.flush() {
            warn!(target: RELAY_TARGET, %error, "failed to flush relayed output");
        }
    }
}

/// Splits text into physical lines, preserving interior blank lines.
///
/// A single trailing newline does not produce an extra empty line; an
/// empty emission still counts as one (blank) line.
fn physical_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}
