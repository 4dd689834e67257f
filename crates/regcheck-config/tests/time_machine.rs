// crates/regcheck-config/tests/time_machine.rs
// ============================================================================
// Module: Tag Expiration Tests
// Description: Duration patterns as seen through a full validation run.
// Purpose: Prove malformed expirations yield exactly one finding each.
// ============================================================================

//! Tag expiration tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use proptest::prelude::*;
use regcheck_config::run_validation;
use serde_json::json;

use crate::common::FakeProbes;
use crate::common::TestResult;
use crate::common::config;
use crate::common::describe;
use crate::common::document_with;
use crate::common::ensure;
use crate::common::structural;

#[test]
fn valid_default_passes() -> TestResult {
    let fake = Arc::new(FakeProbes::default());
    let document = document_with(&json!({"DEFAULT_TAG_EXPIRATION": "2w", "TAG_EXPIRATION_OPTIONS": ["2w"]}));
    let report = run_validation(&config(document), &structural(&fake));
    ensure(report.errors().count() == 0, describe(&report.findings))
}

#[test]
fn malformed_default_is_one_finding() {
    let fake = Arc::new(FakeProbes::default());
    for bad in ["2 weeks", "w", ""] {
        let document = document_with(&json!({"DEFAULT_TAG_EXPIRATION": bad}));
        let report = run_validation(&config(document), &structural(&fake));
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1, "{bad:?}: {}", describe(&report.findings));
        assert_eq!(errors[0].path, "DEFAULT_TAG_EXPIRATION");
    }
}

#[test]
fn malformed_option_is_reported_by_index() {
    let fake = Arc::new(FakeProbes::default());
    let document = document_with(&json!({"TAG_EXPIRATION_OPTIONS": ["2w", "2 weeks"]}));
    let report = run_validation(&config(document), &structural(&fake));
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1, "{}", describe(&report.findings));
    assert_eq!(errors[0].path, "TAG_EXPIRATION_OPTIONS.1");
}

proptest! {
    #[test]
    fn any_well_formed_option_set_passes(count in 0u32 .. 10_000, unit in prop::sample::select(vec!['s', 'm', 'd', 'w', 'y'])) {
        let fake = Arc::new(FakeProbes::default());
        let value = format!("{count}{unit}");
        let document = document_with(&json!({"DEFAULT_TAG_EXPIRATION": value.clone(), "TAG_EXPIRATION_OPTIONS": [value]}));
        let report = run_validation(&config(document), &structural(&fake));
        prop_assert_eq!(report.errors().count(), 0);
    }

    #[test]
    fn unit_without_digits_never_passes(unit in prop::sample::select(vec!["s", "m", "d", "w", "y", "h", " "])) {
        let fake = Arc::new(FakeProbes::default());
        let document = document_with(&json!({"DEFAULT_TAG_EXPIRATION": unit}));
        let report = run_validation(&config(document), &structural(&fake));
        prop_assert_eq!(report.errors().count(), 1);
    }
}
