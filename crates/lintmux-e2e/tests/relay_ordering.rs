//! Relay attribution and ordering around a crash.

use assert_cmd::cargo::cargo_bin;

use lintmux_e2e::{CaptureSink, stub_manifest, supervisor_over};
use lintmux_protocol::AnalysisConfig;

fn tagged_index(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no relayed line contains {needle:?}: {lines:?}"))
}

/// An extension prints several times (a blank line and a multi-line
/// message included), then throws. Every physical line arrives tagged, in
/// original order, and the failure block comes last; the pending request
/// still resolves as failed instead of hanging.
#[test]
fn prints_are_relayed_in_order_before_the_crash_block() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![stub_manifest(
            "loud",
            &stub,
            &[
                "--print",
                "Hello",
                "--print",
                "",
                "--print",
                "multi one\nmulti two",
                "--stderr-line",
                "Unhandled exception: boom",
                "--stderr-line",
                "#0      main (lib/loud.dart:3:9)",
                "--crash-after-prints",
            ],
        )],
        &sink,
    );
    supervisor.start();
    supervisor.configure(AnalysisConfig {
        include_built_in_lints: false,
    });

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    supervisor.shutdown();

    // The router resolved the crashed extension as failed, not hung.
    assert!(report.diagnostics().is_empty());
    assert_eq!(report.failures().len(), 1);

    let lines = sink.lines();
    assert!(
        lines.iter().all(|line| line.starts_with("[loud] ")),
        "untagged relay output: {lines:?}"
    );

    // Print order is preserved, blank line included.
    let hello = tagged_index(&lines, "Hello");
    let blank = lines
        .iter()
        .position(|line| line == "[loud] ")
        .expect("blank print relayed as a tagged blank line");
    let multi_one = tagged_index(&lines, "multi one");
    let multi_two = tagged_index(&lines, "multi two");
    assert!(hello < blank && blank < multi_one && multi_one < multi_two);

    // The crash block is relayed once per physical line, after every
    // print and after the live stderr lines it repeats. The protocol and
    // stderr streams are not ordered against each other, so only the
    // block's position is asserted across streams.
    let live_exception = tagged_index(&lines, "Unhandled exception");
    let block_exception = lines
        .iter()
        .rposition(|line| line.contains("Unhandled exception"))
        .expect("crash block relayed");
    let block_frame = lines
        .iter()
        .rposition(|line| line.contains("lib/loud.dart:3:9"))
        .expect("traceback frame relayed");
    assert!(live_exception < block_exception, "block repeats live stderr");
    assert!(multi_two < block_exception);
    assert!(block_exception < block_frame, "block keeps traceback order");
}

/// Crash location derivation picks up a `path:line:col` prefix from the
/// final stderr line.
#[test]
fn crash_location_is_derived_from_the_traceback() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![stub_manifest(
            "located",
            &stub,
            &[
                "--stderr-line",
                "lib/rules.dart:3:9: unexpected null",
                "--crash-after-prints",
            ],
        )],
        &sink,
    );
    supervisor.start();

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    supervisor.shutdown();

    assert!(matches!(
        report.failures().first(),
        Some(lintmux_host::ExtensionFailure::Crash { location: Some(location), .. })
            if location == "lib/rules.dart:3:9"
    ));
}
