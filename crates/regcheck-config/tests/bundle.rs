// crates/regcheck-config/tests/bundle.rs
// ============================================================================
// Module: Config Bundle Tests
// Description: Directory loading, certificate keys and reference normalization.
// Purpose: Prove bundles load deterministically and reject bad input.
// ============================================================================

//! Config bundle tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::Path;

use regcheck_config::ConfigBundle;
use regcheck_config::bundle::MAX_CERTIFICATE_FILE_SIZE;
use regcheck_config::bundle_relative;
use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn write(root: &Path, name: &str, body: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn loads_document_and_nested_certificates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yaml", b"SERVER_HOSTNAME: quay.example.com\n");
    write(dir.path(), "ssl.cert", b"cert");
    write(dir.path(), "extra_ca_certs/corp.crt", b"ca");
    let bundle = ConfigBundle::load(dir.path()).unwrap();
    assert!(bundle.document.contains("SERVER_HOSTNAME"));
    let names: Vec<&str> = bundle.certificates.names().collect();
    assert_eq!(names, vec!["extra_ca_certs/corp.crt", "ssl.cert"]);
    assert_eq!(bundle.certificates.get("extra_ca_certs/corp.crt"), Some(b"ca".as_slice()));
}

#[test]
fn json_document_is_accepted() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.json", br#"{"SERVER_HOSTNAME": "quay.example.com"}"#);
    let bundle = ConfigBundle::load(dir.path()).unwrap();
    assert!(bundle.document.contains("SERVER_HOSTNAME"));
    assert!(bundle.certificates.is_empty());
}

#[test]
fn missing_document_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ssl.cert", b"cert");
    let err = ConfigBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)), "{err}");
}

#[test]
fn non_mapping_document_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yaml", b"- one\n- two\n");
    let err = ConfigBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");
}

#[test]
fn empty_document_is_an_empty_mapping() {
    let bundle = ConfigBundle::from_parts("", Certificates::new()).unwrap();
    assert_eq!(bundle.document.keys().count(), 0);
}

#[test]
fn oversized_certificate_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yaml", b"{}\n");
    let size = usize::try_from(MAX_CERTIFICATE_FILE_SIZE).unwrap() + 1;
    write(dir.path(), "huge.pem", &vec![b'a'; size]);
    let err = ConfigBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}

// ============================================================================
// SECTION: References
// ============================================================================

#[test]
fn references_normalize_to_bundle_keys() {
    assert_eq!(bundle_relative("/conf/stack/database.pem"), "database.pem");
    assert_eq!(bundle_relative("conf/stack/extra_ca_certs/a.crt"), "extra_ca_certs/a.crt");
    assert_eq!(bundle_relative(" database.pem "), "database.pem");
    assert_eq!(bundle_relative("/etc/ssl/ca.pem"), "etc/ssl/ca.pem");
}
