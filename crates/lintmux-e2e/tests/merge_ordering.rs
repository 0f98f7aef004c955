//! Merge determinism across live extension processes.

use assert_cmd::cargo::cargo_bin;

use lintmux_e2e::{CaptureSink, stub_manifest, supervisor_over};
use lintmux_protocol::AnalysisConfig;

/// Two extensions report on two files; the merged report orders by path,
/// then position, regardless of which process answered first.
#[test]
fn merged_report_is_ordered_by_path_then_position() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![
            stub_manifest(
                "alpha",
                &stub,
                &["--lint", "0:0:0:0:warning:lint:hello_world:Hello world"],
            ),
            stub_manifest("beta", &stub, &["--lint", "1:42:1:42:warning:lint:oy:Oy"]),
        ],
        &sink,
    );
    supervisor.start();
    supervisor.configure(AnalysisConfig {
        include_built_in_lints: true,
    });

    let report = supervisor.analyze_files(&[
        "lib/main.dart".to_owned(),
        "lib/another.dart".to_owned(),
    ]);
    supervisor.shutdown();

    assert!(report.failures().is_empty(), "{:?}", report.failures());
    let summary: Vec<(String, u32, u32, String)> = report
        .diagnostics()
        .iter()
        .map(|d| {
            (
                d.file().to_owned(),
                d.start_line(),
                d.start_column(),
                d.code().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("lib/another.dart".to_owned(), 0, 0, "hello_world".to_owned()),
            ("lib/another.dart".to_owned(), 1, 42, "oy".to_owned()),
            ("lib/main.dart".to_owned(), 0, 0, "hello_world".to_owned()),
            ("lib/main.dart".to_owned(), 1, 42, "oy".to_owned()),
        ]
    );
    assert!(!report.has_blocking_findings(), "warnings alone pass the run");
}

/// Running the same analysis twice produces byte-identical diagnostics.
#[test]
fn repeated_analysis_is_reproducible() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![
            stub_manifest(
                "alpha",
                &stub,
                &["--lint", "0:0:0:0:warning:lint:dup:Same spot"],
            ),
            stub_manifest(
                "beta",
                &stub,
                &["--lint", "0:0:0:0:warning:lint:dup:Same spot"],
            ),
        ],
        &sink,
    );
    supervisor.start();

    let paths = vec!["lib/main.dart".to_owned()];
    let first = supervisor.analyze_files(&paths);
    let second = supervisor.analyze_files(&paths);
    supervisor.shutdown();

    // Both observations are retained, not deduplicated.
    assert_eq!(first.diagnostics().len(), 2);
    assert_eq!(first.diagnostics(), second.diagnostics());
}
