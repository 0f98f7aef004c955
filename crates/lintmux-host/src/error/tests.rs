//! Unit tests for the failure taxonomy.

use rstest::rstest;

use super::*;

fn startup() -> ExtensionFailure {
    ExtensionFailure::Startup {
        name: "alpha".into(),
        message: "binary not found".into(),
    }
}

#[rstest]
#[case::startup(startup(), "extension_startup_failure")]
#[case::crash(
    ExtensionFailure::Crash { name: "alpha".into(), message: "boom".into(), location: None },
    "extension_crashed"
)]
#[case::protocol(
    ExtensionFailure::Protocol { name: "alpha".into(), message: "bad kind".into() },
    "extension_protocol_error"
)]
#[case::unreachable(
    ExtensionFailure::Unreachable { name: "alpha".into(), message: "closed".into() },
    "extension_channel_closed"
)]
#[case::reported(
    ExtensionFailure::Reported { name: "alpha".into(), message: "refused".into() },
    "extension_error"
)]
fn codes_are_stable(#[case] failure: ExtensionFailure, #[case] code: &str) {
    assert_eq!(failure.code(), code);
    assert_eq!(failure.extension(), "alpha");
}

#[test]
fn display_includes_identity_and_message() {
    let text = startup().to_string();
    assert!(text.contains("alpha"));
    assert!(text.contains("binary not found"));
}

#[test]
fn channel_closed_is_attributed() {
    let err = ChannelError::Closed {
        name: "beta".into(),
    };
    assert!(err.to_string().contains("beta"));
}
