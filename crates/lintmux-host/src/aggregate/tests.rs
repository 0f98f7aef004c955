//! Unit tests for deterministic merging.

use lintmux_protocol::{Category, DiagnosticRecord, FileDiagnostics, Severity};

use super::*;

fn record(file: &str, start: (u32, u32), end: (u32, u32), message: &str, code: &str) -> DiagnosticRecord {
    DiagnosticRecord::new(file, start, end, Severity::Warning, Category::Lint, message, code)
}

fn batch_for(file: &str, records: Vec<DiagnosticRecord>) -> Vec<FileDiagnostics> {
    vec![FileDiagnostics::new(file, records)]
}

/// Two extensions, each reporting on two files: merged output orders by
/// path first, then start position, then arrival.
#[test]
fn merges_two_extensions_across_two_files() {
    let hello = |file: &str| record(file, (0, 0), (0, 0), "Hello world", "hello_world");
    let oy = |file: &str| record(file, (0, 0), (1, 42), "Oy", "oy");

    let batch_a = vec![
        FileDiagnostics::new("lib/main.dart", vec![hello("lib/main.dart")]),
        FileDiagnostics::new("lib/another.dart", vec![hello("lib/another.dart")]),
    ];
    let batch_b = vec![
        FileDiagnostics::new("lib/main.dart", vec![oy("lib/main.dart")]),
        FileDiagnostics::new("lib/another.dart", vec![oy("lib/another.dart")]),
    ];

    let merged = merge_batches(vec![batch_a, batch_b]);
    let summary: Vec<(&str, &str)> = merged.iter().map(|d| (d.file(), d.code())).collect();
    assert_eq!(
        summary,
        vec![
            ("lib/another.dart", "hello_world"),
            ("lib/another.dart", "oy"),
            ("lib/main.dart", "hello_world"),
            ("lib/main.dart", "oy"),
        ]
    );
}

/// Merge is commutative under the ordering: whichever extension answers
/// first, the result is byte-identical.
#[test]
fn arrival_order_only_breaks_exact_ties() {
    let first = batch_for("a.dart", vec![record("a.dart", (2, 0), (2, 5), "first", "c1")]);
    let second = batch_for("a.dart", vec![record("a.dart", (1, 0), (1, 5), "second", "c2")]);

    let forward = merge_batches(vec![first.clone(), second.clone()]);
    let backward = merge_batches(vec![second, first]);
    assert_eq!(forward, backward);
    assert_eq!(forward.first().map(DiagnosticRecord::message), Some("second"));
}

#[test]
fn identical_locations_keep_arrival_order() {
    let from_a = batch_for("a.dart", vec![record("a.dart", (0, 0), (0, 0), "from a", "dup")]);
    let from_b = batch_for("a.dart", vec![record("a.dart", (0, 0), (0, 0), "from b", "dup")]);

    let merged = merge_batches(vec![from_a, from_b]);
    let messages: Vec<&str> = merged.iter().map(DiagnosticRecord::message).collect();
    assert_eq!(messages, vec!["from a", "from b"]);
}

#[test]
fn duplicates_are_retained() {
    let observation = record("a.dart", (3, 1), (3, 4), "same finding", "same");
    let merged = merge_batches(vec![
        batch_for("a.dart", vec![observation.clone()]),
        batch_for("a.dart", vec![observation]),
    ]);
    assert_eq!(merged.len(), 2);
}

#[test]
fn empty_batches_merge_to_empty() {
    assert!(merge_batches(Vec::<Vec<FileDiagnostics>>::new()).is_empty());
    assert!(merge_batches(vec![Vec::new(), Vec::new()]).is_empty());
}

#[test]
fn columns_order_within_a_line() {
    let merged = merge_batches(vec![batch_for(
        "a.dart",
        vec![
            record("a.dart", (0, 9), (0, 10), "later", "l"),
            record("a.dart", (0, 2), (0, 3), "earlier", "e"),
        ],
    )]);
    let codes: Vec<&str> = merged.iter().map(DiagnosticRecord::code).collect();
    assert_eq!(codes, vec!["e", "l"]);
}
