//! Textual rendering of the merged analysis report.

use std::io::{self, Write};

use lintmux_protocol::DiagnosticRecord;

/// Renders one line per diagnostic, in the order the aggregator produced:
///
/// ```text
/// <path>:<startLine>:<startColumn> • <message> • <code>
/// ```
pub(crate) fn render_diagnostics(
    out: &mut dyn Write,
    diagnostics: &[DiagnosticRecord],
) -> io::Result<()> {
    for diagnostic in diagnostics {
        writeln!(
            out,
            "{}:{}:{} \u{2022} {} \u{2022} {}",
            diagnostic.file(),
            diagnostic.start_line(),
            diagnostic.start_column(),
            diagnostic.message(),
            diagnostic.code(),
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use lintmux_protocol::{Category, DiagnosticRecord, Severity};

    use super::*;

    fn render(diagnostics: &[DiagnosticRecord]) -> String {
        let mut buffer = Vec::new();
        render_diagnostics(&mut buffer, diagnostics).expect("render to memory");
        String::from_utf8(buffer).expect("utf8 report")
    }

    #[test]
    fn renders_one_line_per_diagnostic() {
        let diagnostics = vec![
            DiagnosticRecord::at_point(
                "lib/another.dart",
                0,
                0,
                Severity::Warning,
                Category::Lint,
                "Hello world",
                "hello_world",
            ),
            DiagnosticRecord::new(
                "lib/main.dart",
                (1, 42),
                (1, 44),
                Severity::Error,
                Category::Lint,
                "Oy",
                "oy",
            ),
        ];
        assert_eq!(
            render(&diagnostics),
            "lib/another.dart:0:0 \u{2022} Hello world \u{2022} hello_world\n\
             lib/main.dart:1:42 \u{2022} Oy \u{2022} oy\n"
        );
    }

    #[test]
    fn empty_report_renders_nothing() {
        assert_eq!(render(&[]), "");
    }
}
