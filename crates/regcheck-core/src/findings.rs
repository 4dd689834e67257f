// crates/regcheck-core/src/findings.rs
// ============================================================================
// Module: Validation Findings
// Description: Severity-graded findings emitted by field-group validators.
// Purpose: Provide the single result currency shared by every validator.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Finding`] ties one validation outcome to a dotted configuration path.
//! Any [`Severity::Error`] finding invalidates the whole configuration;
//! warnings are informational and never block.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the configuration from being considered valid.
    Error,
    /// Reported to the operator but never blocks.
    Warning,
}

impl Severity {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation outcome attributed to a configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// Field group that produced the finding.
    pub field_group: String,
    /// Dotted path of the offending field (e.g. `DISTRIBUTED_STORAGE_CONFIG.default.s3_bucket`).
    pub path: String,
    /// Severity classification.
    pub severity: Severity,
    /// Operator-facing message.
    pub message: String,
}

impl Finding {
    /// Creates an error-severity finding.
    #[must_use]
    pub fn error(
        field_group: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_group: field_group.into(),
            path: path.into(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Creates a warning-severity finding.
    #[must_use]
    pub fn warning(
        field_group: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_group: field_group.into(),
            path: path.into(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Returns true when the finding blocks validation.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.severity, self.path, self.field_group, self.message)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Counts error-severity findings.
#[must_use]
pub fn error_count(findings: &[Finding]) -> usize {
    findings.iter().filter(|finding| finding.is_error()).count()
}

/// Counts warning-severity findings.
#[must_use]
pub fn warning_count(findings: &[Finding]) -> usize {
    findings.iter().filter(|finding| finding.severity == Severity::Warning).count()
}

/// Returns true when any finding is an error.
#[must_use]
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(Finding::is_error)
}
