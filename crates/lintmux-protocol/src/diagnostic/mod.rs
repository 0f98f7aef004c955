//! Diagnostic model reported by lint extensions.
//!
//! A [`DiagnosticRecord`] is one reported issue: a source span (0-based
//! lines and columns), a severity, a category, a human-readable message,
//! and a machine-readable code. Extensions group records per analyzed file
//! in [`FileDiagnostics`] when answering an analysis request.

use serde::{Deserialize, Serialize};

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed; drives a non-zero exit status.
    Error,
    /// Should be reviewed.
    #[default]
    Warning,
    /// Informational only.
    Info,
}

/// Category of a reported diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A lint rule finding. The default for extension-produced records.
    #[default]
    Lint,
    /// A suggestion that does not indicate a defect.
    Hint,
    /// A tracked follow-up marker.
    Todo,
}

/// One issue reported by an extension for a source unit.
///
/// Lines and columns are 0-based. A zero-width span (`start == end`) is the
/// degenerate span used when an extension supplies no range of its own.
///
/// # Example
///
/// ```
/// use lintmux_protocol::{Category, DiagnosticRecord, Severity};
///
/// let record = DiagnosticRecord::new(
///     "lib/main.dart",
///     (0, 0),
///     (0, 0),
///     Severity::Warning,
///     Category::Lint,
///     "Hello world",
///     "hello_world",
/// );
/// assert_eq!(record.file(), "lib/main.dart");
/// assert_eq!(record.start_line(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiagnosticRecord {
    file: String,
    start_line: u32,
    start_column: u32,
    end_line: u32,
    end_column: u32,
    severity: Severity,
    category: Category,
    message: String,
    code: String,
}

impl DiagnosticRecord {
    /// Creates a record spanning `start` to `end`, each `(line, column)`.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        start: (u32, u32),
        end: (u32, u32),
        severity: Severity,
        category: Category,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            start_line: start.0,
            start_column: start.1,
            end_line: end.0,
            end_column: end.1,
            severity,
            category,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Creates a record with a zero-width span at `line`:`column`.
    #[must_use]
    pub fn at_point(
        file: impl Into<String>,
        line: u32,
        column: u32,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::new(file, (line, column), (line, column), severity, category, message, code)
    }

    /// Returns the path of the file the diagnostic points at.
    #[must_use]
    pub fn file(&self) -> &str {
        self.file.as_str()
    }

    /// Returns the 0-based start line.
    #[must_use]
    pub const fn start_line(&self) -> u32 {
        self.start_line
    }

    /// Returns the 0-based start column.
    #[must_use]
    pub const fn start_column(&self) -> u32 {
        self.start_column
    }

    /// Returns the 0-based end line.
    #[must_use]
    pub const fn end_line(&self) -> u32 {
        self.end_line
    }

    /// Returns the 0-based end column.
    #[must_use]
    pub const fn end_column(&self) -> u32 {
        self.end_column
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns `true` when the record carries [`Severity::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns the key merged output is ordered by: file path, then start
    /// line, then start column. Arrival order breaks remaining ties.
    #[must_use]
    pub fn ordering_key(&self) -> (&str, u32, u32) {
        (self.file.as_str(), self.start_line, self.start_column)
    }
}

/// Diagnostics grouped under one analyzed file in an analysis response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileDiagnostics {
    file: String,
    diagnostics: Vec<DiagnosticRecord>,
}

impl FileDiagnostics {
    /// Creates a group for `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, diagnostics: Vec<DiagnosticRecord>) -> Self {
        Self {
            file: file.into(),
            diagnostics,
        }
    }

    /// Returns the analyzed file path.
    #[must_use]
    pub fn file(&self) -> &str {
        self.file.as_str()
    }

    /// Returns the diagnostics reported for the file.
    #[must_use]
    pub fn diagnostics(&self) -> &[DiagnosticRecord] {
        &self.diagnostics
    }

    /// Consumes the group, yielding its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<DiagnosticRecord> {
        self.diagnostics
    }
}
