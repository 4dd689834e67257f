// crates/regcheck-core/tests/document.rs
// ============================================================================
// Module: Raw Document Tests
// Description: Strict decode and lenient scalar behavior.
// Purpose: Ensure malformed values surface construction errors, never findings.
// ============================================================================

//! Raw document tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use regcheck_core::ConfigError;
use regcheck_core::RawConfig;
use serde::Deserialize;

#[test]
fn absent_and_null_keys_decode_to_none() {
    let raw = RawConfig::from_yaml_str("FEATURE_MAILING:\nSERVER_HOSTNAME: quay.example.com\n").unwrap();
    assert_eq!(raw.decode::<bool>("FEATURE_MAILING").unwrap(), None);
    assert_eq!(raw.decode::<bool>("MISSING").unwrap(), None);
    assert!(raw.decode_or("FEATURE_MAILING", true).unwrap());
    assert!(!raw.contains("FEATURE_MAILING"));
}

#[test]
fn type_mismatch_is_a_construction_error() {
    let raw = RawConfig::from_yaml_str("FEATURE_MAILING: \"yes please\"\n").unwrap();
    let err = raw.decode::<bool>("FEATURE_MAILING").unwrap_err();
    match err {
        ConfigError::Construction {
            key,
            ..
        } => assert_eq!(key, "FEATURE_MAILING"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_mapping_documents_are_rejected() {
    assert!(matches!(RawConfig::from_yaml_str("- a\n- b\n"), Err(ConfigError::Parse(_))));
    assert!(matches!(RawConfig::from_yaml_str("key: [unterminated"), Err(ConfigError::Parse(_))));
    assert!(RawConfig::from_yaml_str("").unwrap().keys().next().is_none());
}

#[test]
fn json_documents_parse_as_yaml() {
    let raw = RawConfig::from_yaml_str(r#"{"DB_URI": "postgresql://db/quay", "MAIL_PORT": 25}"#).unwrap();
    assert_eq!(raw.decode::<String>("DB_URI").unwrap().as_deref(), Some("postgresql://db/quay"));
    assert_eq!(raw.decode::<u16>("MAIL_PORT").unwrap(), Some(25));
}

#[derive(Debug, Deserialize)]
struct PortHolder {
    #[serde(default, deserialize_with = "regcheck_core::document::flexible_int")]
    port: Option<i64>,
}

#[test]
fn flexible_int_accepts_numbers_and_numeric_strings() {
    for (text, expected) in [
        ("port: 443", Some(443)),
        ("port: \"8080\"", Some(8080)),
        ("port: 9000.0", Some(9000)),
        ("port: \"\"", None),
        ("{}", None),
    ] {
        let raw = RawConfig::from_yaml_str(&format!("holder: {{{}}}", text.trim_matches(['{', '}']))).unwrap();
        let holder: PortHolder = raw.decode("holder").unwrap().unwrap();
        assert_eq!(holder.port, expected, "input {text}");
    }
}

#[test]
fn flexible_int_rejects_garbage() {
    for text in ["port: \"eighty\"", "port: 80.5", "port: [80]", "port: true"] {
        let raw = RawConfig::from_yaml_str(&format!("holder: {{{text}}}")).unwrap();
        assert!(raw.decode::<PortHolder>("holder").is_err(), "input {text}");
    }
}
