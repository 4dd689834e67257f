// crates/regcheck-core/src/rules.rs
// ============================================================================
// Module: Shared Rules
// Description: Reusable structural rules returning field-attributed findings.
// Purpose: Keep per-group validators declarative and consistent in wording.
// Dependencies: url, crate::findings
// ============================================================================

//! ## Overview
//! Each rule inspects one well-typed value and returns `Some(Finding)` when
//! the value violates it. Rules never panic and never perform I/O.

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::Url;

use crate::findings::Finding;
use crate::options::Certificates;

// ============================================================================
// SECTION: Presence
// ============================================================================

/// Requires a non-blank string.
#[must_use]
pub fn require_string(field_group: &str, path: &str, value: Option<&str>) -> Option<Finding> {
    match value {
        Some(text) if !text.trim().is_empty() => None,
        _ => Some(Finding::error(field_group, path, format!("{path} is required"))),
    }
}

/// Requires a present value of any type.
#[must_use]
pub fn require_present<T>(field_group: &str, path: &str, value: Option<&T>) -> Option<Finding> {
    if value.is_some() {
        None
    } else {
        Some(Finding::error(field_group, path, format!("{path} is required")))
    }
}

/// Requires a non-empty list.
#[must_use]
pub fn require_non_empty<T>(field_group: &str, path: &str, values: &[T]) -> Option<Finding> {
    if values.is_empty() {
        Some(Finding::error(field_group, path, format!("{path} must contain at least one entry")))
    } else {
        None
    }
}

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Returns true when the value matches `^[a-zA-Z-0-9\.]+(:[0-9]+)?$`.
#[must_use]
pub fn is_hostname(value: &str) -> bool {
    let (host, port) = match value.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (value, None),
    };
    let host_ok = !host.is_empty()
        && host.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.');
    let port_ok = port.is_none_or(|port| !port.is_empty() && port.chars().all(|ch| ch.is_ascii_digit()));
    host_ok && port_ok
}

/// Requires a hostname with optional port.
#[must_use]
pub fn hostname(field_group: &str, path: &str, value: &str) -> Option<Finding> {
    if is_hostname(value) {
        None
    } else {
        Some(Finding::error(
            field_group,
            path,
            format!("{path} must be a hostname with an optional port, got `{value}`"),
        ))
    }
}

/// Requires an absolute URL with a host and one of the listed schemes.
#[must_use]
pub fn url(field_group: &str, path: &str, value: &str, schemes: &[&str]) -> Option<Finding> {
    match Url::parse(value) {
        Ok(parsed) if parsed.host_str().is_some_and(|host| !host.is_empty()) => {
            if schemes.is_empty() || schemes.contains(&parsed.scheme()) {
                None
            } else {
                Some(Finding::error(
                    field_group,
                    path,
                    format!("{path} must use one of the schemes: {}", schemes.join(", ")),
                ))
            }
        }
        Ok(_) => Some(Finding::error(field_group, path, format!("{path} must include a host"))),
        Err(err) => Some(Finding::error(field_group, path, format!("{path} is not a valid url: {err}"))),
    }
}

/// Requires membership in a closed set of values.
#[must_use]
pub fn one_of(field_group: &str, path: &str, value: &str, allowed: &[&str]) -> Option<Finding> {
    if allowed.contains(&value) {
        None
    } else {
        Some(Finding::error(
            field_group,
            path,
            format!("{path} must be one of {}, got `{value}`", allowed.join(", ")),
        ))
    }
}

/// Returns true when the value matches `^\d+[smdwy]$`.
#[must_use]
pub fn is_time_duration(value: &str) -> bool {
    let Some(unit) = value.chars().last() else {
        return false;
    };
    let digits = &value[.. value.len() - unit.len_utf8()];
    matches!(unit, 's' | 'm' | 'd' | 'w' | 'y')
        && !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit())
}

/// Requires a duration such as `2w` or `30d`.
#[must_use]
pub fn time_duration(field_group: &str, path: &str, value: &str) -> Option<Finding> {
    if is_time_duration(value) {
        None
    } else {
        Some(Finding::error(
            field_group,
            path,
            format!("{path} must be a number followed by one of s, m, d, w, y (got `{value}`)"),
        ))
    }
}

/// Requires a TCP port in `1..=65535`.
#[must_use]
pub fn port(field_group: &str, path: &str, value: i64) -> Option<Finding> {
    if (1 ..= 65_535).contains(&value) {
        None
    } else {
        Some(Finding::error(field_group, path, format!("{path} must be between 1 and 65535")))
    }
}

/// Requires a strictly positive integer.
#[must_use]
pub fn positive(field_group: &str, path: &str, value: i64) -> Option<Finding> {
    if value > 0 {
        None
    } else {
        Some(Finding::error(field_group, path, format!("{path} must be greater than zero")))
    }
}

/// Returns true for a plausible `local@domain.tld` address.
#[must_use]
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Requires an email address.
#[must_use]
pub fn email(field_group: &str, path: &str, value: &str) -> Option<Finding> {
    if is_email(value) {
        None
    } else {
        Some(Finding::error(field_group, path, format!("{path} must be an email address")))
    }
}

// ============================================================================
// SECTION: Certificates
// ============================================================================

/// Requires a named file in the certificate bundle.
#[must_use]
pub fn certificate_present(
    field_group: &str,
    path: &str,
    certificates: &Certificates,
    name: &str,
) -> Option<Finding> {
    if certificates.contains(name) {
        None
    } else {
        Some(Finding::error(
            field_group,
            path,
            format!("{path} references `{name}`, which is missing from the certificate bundle"),
        ))
    }
}

// ============================================================================
// SECTION: Collection
// ============================================================================

/// Collects the violations from a set of rule results.
#[must_use]
pub fn collect<I>(results: I) -> Vec<Finding>
where
    I: IntoIterator<Item = Option<Finding>>,
{
    results.into_iter().flatten().collect()
}
