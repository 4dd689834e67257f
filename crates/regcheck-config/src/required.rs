// crates/regcheck-config/src/required.rs
// ============================================================================
// Module: Required Keys
// Description: Globally mandatory keys checked before any field group.
// Purpose: Report missing prerequisites independent of group gating.
// Dependencies: regcheck-core, serde_json
// ============================================================================

//! ## Overview
//! Missing core keys are errors. Missing secret material is a warning: the
//! registry refuses to start without it, but a bundle under review often has
//! secrets injected at deploy time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::Finding;
use regcheck_core::RawConfig;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name used for findings from this check.
pub const NAME: &str = "Required";
/// Keys every document must carry with a non-empty value.
pub const REQUIRED_KEYS: &[&str] = &[
    "SERVER_HOSTNAME",
    "DB_URI",
    "DISTRIBUTED_STORAGE_CONFIG",
    "BUILDLOGS_REDIS",
    "USER_EVENTS_REDIS",
    "DISTRIBUTED_STORAGE_PREFERENCE",
    "TAG_EXPIRATION_OPTIONS",
];
/// Secret keys whose absence is reported as a warning.
pub const SECRET_KEYS: &[&str] = &["SECRET_KEY", "DATABASE_SECRET_KEY"];

/// Returns true for keys this check owns outright.
#[must_use]
pub fn owns(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

// ============================================================================
// SECTION: Check
// ============================================================================

/// Reports every missing or empty required key, then missing secrets.
#[must_use]
pub fn check(document: &RawConfig) -> Vec<Finding> {
    let mut findings: Vec<Finding> = REQUIRED_KEYS
        .iter()
        .filter(|key| document.get(key).is_none_or(is_empty))
        .map(|key| Finding::error(NAME, *key, format!("{key} is required")))
        .collect();
    findings.extend(
        SECRET_KEYS
            .iter()
            .filter(|key| document.get(key).is_none_or(is_empty))
            .map(|key| Finding::warning(NAME, *key, format!("{key} is not set; the registry will not start without it"))),
    );
    findings
}

/// Empty strings, sequences and mappings count as missing.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
