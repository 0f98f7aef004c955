//! Fault containment: one extension's failure never poisons the run.

use assert_cmd::cargo::cargo_bin;

use lintmux_e2e::{CaptureSink, stub_manifest, supervisor_over};
use lintmux_host::ExtensionFailure;
use lintmux_protocol::AnalysisConfig;

const HELLO_LINT: &str = "0:0:0:0:warning:lint:hello_world:Hello world";

#[test]
fn crash_before_answering_degrades_to_one_failure() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![
            stub_manifest("steady", &stub, &["--lint", HELLO_LINT]),
            stub_manifest("brittle", &stub, &["--crash-after-prints"]),
        ],
        &sink,
    );
    supervisor.start();

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);

    // The steady extension's diagnostics survive.
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(
        report.diagnostics().first().map(|d| d.code()),
        Some("hello_world")
    );
    // Exactly one failure entry, attributed to the crashed extension.
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        report.failures().first(),
        Some(ExtensionFailure::Crash { name, .. }) if name == "brittle"
    ));
    assert!(report.has_blocking_findings());

    // The crashed extension stays excluded from the next fan-out.
    let next = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    assert_eq!(supervisor.live_names(), vec!["steady"]);
    assert_eq!(next.diagnostics().len(), 1);
    assert!(next.failures().is_empty());

    supervisor.shutdown();
}

#[test]
fn startup_failure_is_reported_and_surfaced_as_meta_diagnostic() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![
            stub_manifest("steady", &stub, &["--lint", HELLO_LINT]),
            stub_manifest("broken", &stub, &["--skip-handshake"]),
        ],
        &sink,
    );
    supervisor.start();
    supervisor.configure(AnalysisConfig {
        include_built_in_lints: true,
    });
    assert_eq!(supervisor.live_names(), vec!["steady"]);

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    supervisor.shutdown();

    // The startup-failure message is relayed under the broken extension's
    // identity.
    let relayed = sink.contents();
    assert!(relayed.contains("[broken]"), "missing tag in {relayed}");
    assert!(relayed.contains("failed to start"));

    // One user diagnostic plus one meta-diagnostic about the failure.
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        report.failures().first(),
        Some(ExtensionFailure::Startup { name, .. }) if name == "broken"
    ));
    // Both records anchor at lib/main.dart:0:0; the meta-diagnostic is
    // the last-arriving batch, so the user diagnostic sorts first.
    let codes: Vec<&str> = report.diagnostics().iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["hello_world", "extension_startup_failure"]);
}

#[test]
fn protocol_version_mismatch_is_a_distinct_startup_failure() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![stub_manifest(
            "future",
            &stub,
            &["--protocol-version", "99"],
        )],
        &sink,
    );
    supervisor.start();

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    supervisor.shutdown();

    assert!(matches!(
        report.failures().first(),
        Some(ExtensionFailure::Startup { message, .. }) if message.contains("protocol version 99")
    ));
}

#[test]
fn explicit_error_response_resolves_the_fanout() {
    let stub = cargo_bin("lintmux-stub");
    let sink = CaptureSink::new();
    let mut supervisor = supervisor_over(
        vec![
            stub_manifest("steady", &stub, &["--lint", HELLO_LINT]),
            stub_manifest(
                "refusing",
                &stub,
                &["--error-response", "analysis not supported"],
            ),
        ],
        &sink,
    );
    supervisor.start();

    let report = supervisor.analyze_files(&["lib/main.dart".to_owned()]);

    assert_eq!(report.diagnostics().len(), 1);
    assert!(matches!(
        report.failures().first(),
        Some(ExtensionFailure::Reported { name, message })
            if name == "refusing" && message == "analysis not supported"
    ));

    // An explicit error response is not a crash: the extension stays live
    // and answers the next request the same way.
    assert_eq!(supervisor.live_names(), vec!["refusing", "steady"]);
    let next = supervisor.analyze_files(&["lib/main.dart".to_owned()]);
    assert_eq!(next.failures().len(), 1);

    supervisor.shutdown();
}
