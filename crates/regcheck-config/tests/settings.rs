// crates/regcheck-config/tests/settings.rs
// ============================================================================
// Module: Validator Settings Tests
// Description: TOML loading, defaults, ranges and event sink selection.
// Purpose: Prove invalid settings fail closed with a clear message.
// ============================================================================

//! Validator settings tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::time::Duration;

use regcheck_config::SettingsError;
use regcheck_config::ValidatorSettings;
use regcheck_config::settings::EventSinkKind;
use regcheck_config::settings::MAX_SETTINGS_FILE_SIZE;
use regcheck_core::Certificates;
use regcheck_core::Probes;
use regcheck_core::ValidationEvent;
use regcheck_core::ValidationMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn invalid(content: &str) -> String {
    match ValidatorSettings::from_toml_str(content) {
        Err(SettingsError::Invalid(message)) => message,
        other => panic!("expected invalid settings, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn empty_settings_use_defaults() {
    let settings = ValidatorSettings::from_toml_str("").unwrap();
    assert_eq!(settings, ValidatorSettings::default());
    assert_eq!(settings.mode, ValidationMode::Connectivity);
    assert_eq!(settings.timeouts().connect, Duration::from_millis(3_000));
    assert_eq!(settings.timeouts().request, Duration::from_millis(5_000));
    assert_eq!(settings.storage.default_region, "us-east-1");
}

#[test]
fn full_settings_parse() {
    let settings = ValidatorSettings::from_toml_str(
        r#"
mode = "structural"

[probe]
connect_timeout_ms = 250
request_timeout_ms = 750

[storage]
default_region = "eu-west-1"

[events]
sink = "stderr"
"#,
    )
    .unwrap();
    assert_eq!(settings.mode, ValidationMode::Structural);
    assert_eq!(settings.probe.connect_timeout_ms, 250);
    assert_eq!(settings.events.sink, EventSinkKind::Stderr);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = ValidatorSettings::from_toml_str("[probe]\nretries = 3\n").unwrap_err();
    assert!(matches!(err, SettingsError::Parse(_)), "{err}");
}

#[test]
fn timeouts_outside_range_are_rejected() {
    assert_eq!(invalid("[probe]\nconnect_timeout_ms = 50\n"), "probe.connect_timeout_ms must be between 100 and 9000");
    assert_eq!(invalid("[probe]\nrequest_timeout_ms = 60000\n"), "probe.request_timeout_ms must be between 500 and 9000");
}

#[test]
fn connect_must_not_exceed_request() {
    let message = invalid("[probe]\nconnect_timeout_ms = 4000\nrequest_timeout_ms = 1000\n");
    assert_eq!(message, "probe.connect_timeout_ms must not exceed probe.request_timeout_ms");
}

#[test]
fn blank_region_is_rejected() {
    assert_eq!(invalid("[storage]\ndefault_region = \"  \"\n"), "storage.default_region must be non-empty");
}

#[test]
fn file_sink_requires_path() {
    assert_eq!(invalid("[events]\nsink = \"file\"\n"), "events.path is required when events.sink is file");
    assert_eq!(
        invalid("[events]\nsink = \"stderr\"\npath = \"/tmp/events.jsonl\"\n"),
        "events.path is only valid when events.sink is file"
    );
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn named_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = ValidatorSettings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, SettingsError::Io(_)), "{err}");
}

#[test]
fn load_reads_named_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("regcheck.toml");
    fs::write(&path, "mode = \"structural\"\n").unwrap();
    let settings = ValidatorSettings::load(Some(&path)).unwrap();
    assert_eq!(settings.mode, ValidationMode::Structural);
}

#[test]
fn oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("regcheck.toml");
    fs::write(&path, vec![b'#'; MAX_SETTINGS_FILE_SIZE + 1]).unwrap();
    let err = ValidatorSettings::load(Some(&path)).unwrap_err();
    assert_eq!(err.to_string(), "invalid settings: settings file exceeds size limit");
}

#[test]
fn non_utf8_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("regcheck.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    let err = ValidatorSettings::load(Some(&path)).unwrap_err();
    assert_eq!(err.to_string(), "invalid settings: settings file must be utf-8");
}

// ============================================================================
// SECTION: Options
// ============================================================================

#[test]
fn file_sink_writes_json_lines() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("events.jsonl");
    let content = format!("mode = \"structural\"\n[events]\nsink = \"file\"\npath = {:?}\n", log.display().to_string());
    let settings = ValidatorSettings::from_toml_str(&content).unwrap();
    let options = settings.options(Certificates::new(), Probes::offline()).unwrap();
    assert_eq!(options.mode, ValidationMode::Structural);
    options.emit(&ValidationEvent::run_started(options.mode));
    let written = fs::read_to_string(&log).unwrap();
    let line: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
    assert_eq!(line["event"], "run_started");
}

#[test]
fn options_carry_region_and_timeouts() {
    let settings = ValidatorSettings::from_toml_str("[storage]\ndefault_region = \" ap-south-1 \"\n").unwrap();
    let options = settings.options(Certificates::new(), Probes::offline()).unwrap();
    assert_eq!(options.default_region, "ap-south-1");
    assert_eq!(options.timeouts, settings.timeouts());
}
