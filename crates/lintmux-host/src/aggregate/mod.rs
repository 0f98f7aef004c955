//! Deterministic merging of per-extension diagnostic batches.
//!
//! Responses arrive in whatever order the extensions happen to finish.
//! The merge concatenates all batches in arrival order and stable-sorts by
//! (file path, start line, start column), so arrival order is the final
//! tiebreaker and the output is byte-identical across runs for the same
//! set of diagnostics. Nothing is deduplicated: two extensions reporting
//! the same finding are two independent observations.

use lintmux_protocol::{DiagnosticRecord, FileDiagnostics};

/// Merges per-extension batches into one deterministically ordered list.
///
/// # Example
///
/// ```
/// use lintmux_host::aggregate::merge_batches;
/// use lintmux_protocol::{Category, DiagnosticRecord, FileDiagnostics, Severity};
///
/// let record = |file: &str, line| {
///     DiagnosticRecord::at_point(file, line, 0, Severity::Warning, Category::Lint, "m", "c")
/// };
/// let merged = merge_batches(vec![
///     vec![FileDiagnostics::new("b.dart", vec![record("b.dart", 1)])],
///     vec![FileDiagnostics::new("a.dart", vec![record("a.dart", 9)])],
/// ]);
/// assert_eq!(merged.first().map(|d| d.file()), Some("a.dart"));
/// ```
#[must_use]
pub fn merge_batches<I>(batches: I) -> Vec<DiagnosticRecord>
where
    I: IntoIterator<Item = Vec<FileDiagnostics>>,
{
    let mut merged: Vec<DiagnosticRecord> = batches
        .into_iter()
        .flatten()
        .flat_map(FileDiagnostics::into_diagnostics)
        .collect();
    merged.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
    merged
}

#[cfg(test)]
mod tests;
