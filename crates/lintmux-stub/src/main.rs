//! Scriptable reference extension speaking the lintmux protocol.
//!
//! The stub announces the handshake, then answers every request on stdin:
//! configured diagnostics for `analysisErrorsRequest` (applied to each
//! requested file), an acknowledgement for `setConfigRequest`, and a clean
//! exit for `shutdownNotification`. Flags turn it into the misbehaving
//! peers the host must contain: print emissions before responding, stderr
//! output, an explicit error response, or an outright crash.
//!
//! It doubles as the workspace's protocol conformance fixture: the e2e
//! suite drives the real supervisor against it.

use std::io::{self, BufRead, Write as _};
use std::process::ExitCode;

use clap::Parser;

use lintmux_protocol::codec::{self, CodecError};
use lintmux_protocol::{
    Category, DiagnosticRecord, ExtensionMessage, FileDiagnostics, HostMessage, PROTOCOL_VERSION,
    Severity,
};

/// One diagnostic the stub reports for every analyzed file.
///
/// Parsed from `startLine:startCol:endLine:endCol:severity:category:code:message`;
/// the message is last so it may contain colons.
#[derive(Debug, Clone)]
struct LintSpec {
    start: (u32, u32),
    end: (u32, u32),
    severity: Severity,
    category: Category,
    code: String,
    message: String,
}

impl LintSpec {
    fn to_record(&self, file: &str) -> DiagnosticRecord {
        DiagnosticRecord::new(
            file,
            self.start,
            self.end,
            self.severity,
            self.category,
            self.message.clone(),
            self.code.clone(),
        )
    }
}

fn parse_lint(raw: &str) -> Result<LintSpec, String> {
    let mut parts = raw.splitn(8, ':');
    let mut next = |label: &str| {
        parts
            .next()
            .ok_or_else(|| format!("lint spec is missing its {label}"))
    };
    let start_line = parse_number(next("start line")?)?;
    let start_column = parse_number(next("start column")?)?;
    let end_line = parse_number(next("end line")?)?;
    let end_column = parse_number(next("end column")?)?;
    let severity = parse_severity(next("severity")?)?;
    let category = parse_category(next("category")?)?;
    let code = next("code")?.to_owned();
    let message = next("message")?.to_owned();
    Ok(LintSpec {
        start: (start_line, start_column),
        end: (end_line, end_column),
        severity,
        category,
        code,
        message,
    })
}

fn parse_number(raw: &str) -> Result<u32, String> {
    raw.parse()
        .map_err(|_| format!("'{raw}' is not a 0-based position"))
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    match raw {
        "error" => Ok(Severity::Error),
        "warning" => Ok(Severity::Warning),
        "info" => Ok(Severity::Info),
        other => Err(format!("unknown severity '{other}'")),
    }
}

fn parse_category(raw: &str) -> Result<Category, String> {
    match raw {
        "lint" => Ok(Category::Lint),
        "hint" => Ok(Category::Hint),
        "todo" => Ok(Category::Todo),
        other => Err(format!("unknown category '{other}'")),
    }
}

/// Scriptable lintmux extension.
#[derive(Debug, Parser)]
#[command(name = "lintmux-stub")]
struct StubArgs {
    /// Name announced in the handshake.
    #[arg(long, default_value = "stub")]
    name: String,

    /// Protocol version announced in the handshake.
    #[arg(long, default_value_t = PROTOCOL_VERSION)]
    protocol_version: u32,

    /// Exit immediately without handshaking.
    #[arg(long)]
    skip_handshake: bool,

    /// Diagnostic reported for every analyzed file
    /// (`startLine:startCol:endLine:endCol:severity:category:code:message`).
    #[arg(long = "lint", value_parser = parse_lint)]
    lints: Vec<LintSpec>,

    /// Print notification emitted when an analysis request arrives, in
    /// flag order, before responding. May contain embedded newlines.
    #[arg(long = "print")]
    prints: Vec<String>,

    /// Line written to stderr when an analysis request arrives.
    #[arg(long = "stderr-line")]
    stderr_lines: Vec<String>,

    /// Exit abnormally after emitting prints instead of responding.
    #[arg(long)]
    crash_after_prints: bool,

    /// Answer analysis requests with an explicit error response.
    #[arg(long)]
    error_response: Option<String>,
}

fn main() -> ExitCode {
    let args = StubArgs::parse();
    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(io::stderr(), "lintmux-stub: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &StubArgs) -> Result<ExitCode, CodecError> {
    if args.skip_handshake {
        return Ok(ExitCode::from(64));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    codec::write_line(
        &mut out,
        &ExtensionMessage::Handshake {
            protocol_version: args.protocol_version,
            name: args.name.clone(),
        },
    )?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: HostMessage = codec::decode_line(&line)?;
        match message {
            HostMessage::AnalysisErrorsRequest { id, files } => {
                for text in &args.prints {
                    codec::write_line(
                        &mut out,
                        &ExtensionMessage::PrintNotification {
                            message: text.clone(),
                        },
                    )?;
                }
                for text in &args.stderr_lines {
                    writeln!(io::stderr(), "{text}").map_err(CodecError::Io)?;
                }
                if args.crash_after_prints {
                    return Ok(ExitCode::from(70));
                }
                if let Some(message) = &args.error_response {
                    codec::write_line(
                        &mut out,
                        &ExtensionMessage::ErrorResponse {
                            id,
                            message: message.clone(),
                        },
                    )?;
                    continue;
                }
                let lints: Vec<FileDiagnostics> = files
                    .iter()
                    .map(|file| {
                        FileDiagnostics::new(
                            file.clone(),
                            args.lints.iter().map(|spec| spec.to_record(file)).collect(),
                        )
                    })
                    .collect();
                codec::write_line(
                    &mut out,
                    &ExtensionMessage::AnalysisErrorsResult { id, lints },
                )?;
            }
            HostMessage::SetConfigRequest { id, .. } => {
                codec::write_line(&mut out, &ExtensionMessage::SetConfigResult { id })?;
            }
            HostMessage::ShutdownNotification => return Ok(ExitCode::SUCCESS),
        }
    }
    // The host closed stdin without a shutdown notification; treat it as
    // the end of the session.
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_lint_spec() {
        let spec = parse_lint("0:0:1:42:warning:lint:oy:Oy").expect("valid spec");
        assert_eq!(spec.start, (0, 0));
        assert_eq!(spec.end, (1, 42));
        assert_eq!(spec.severity, Severity::Warning);
        assert_eq!(spec.category, Category::Lint);
        assert_eq!(spec.code, "oy");
        assert_eq!(spec.message, "Oy");
    }

    #[test]
    fn message_may_contain_colons() {
        let spec = parse_lint("0:0:0:0:error:hint:c:prefer x: not y").expect("valid spec");
        assert_eq!(spec.message, "prefer x: not y");
    }

    #[test]
    fn rejects_unknown_severity() {
        let err = parse_lint("0:0:0:0:fatal:lint:c:m").expect_err("bad severity");
        assert!(err.contains("fatal"));
    }

    #[test]
    fn rejects_truncated_specs() {
        assert!(parse_lint("0:0:0:0").is_err());
    }

    #[test]
    fn record_targets_the_analyzed_file() {
        let spec = parse_lint("2:1:2:5:info:todo:c:m").expect("valid spec");
        let record = spec.to_record("lib/a.dart");
        assert_eq!(record.file(), "lib/a.dart");
        assert_eq!(record.start_line(), 2);
    }
}
