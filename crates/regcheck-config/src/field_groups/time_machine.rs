// crates/regcheck-config/src/field_groups/time_machine.rs
// ============================================================================
// Module: Time Machine
// Description: Tag expiration defaults and the options offered to users.
// Purpose: Validate expiration durations and their cross reference.
// Dependencies: regcheck-core
// ============================================================================

//! Tag expiration durations use the `^\d+[smdwy]$` pattern. A well-formed
//! default must also appear among the offered options.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::rules;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "TimeMachine";
/// Default expiration key.
pub const DEFAULT_KEY: &str = "DEFAULT_TAG_EXPIRATION";
/// Options key.
pub const OPTIONS_KEY: &str = "TAG_EXPIRATION_OPTIONS";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[DEFAULT_KEY, OPTIONS_KEY, "FEATURE_CHANGE_TAG_EXPIRATION"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tag expiration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMachine {
    /// Default expiration applied to tags.
    pub default_expiration: String,
    /// Expirations a user may choose.
    pub options: Vec<String>,
    /// Users may change tag expiration.
    pub change_tag_expiration: bool,
}

impl TimeMachine {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            default_expiration: raw.decode_or(DEFAULT_KEY, "2w".to_string())?,
            options: raw.decode_or_default(OPTIONS_KEY)?,
            change_tag_expiration: raw.decode_or("FEATURE_CHANGE_TAG_EXPIRATION", true)?,
        })
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let default_finding = rules::time_duration(NAME, DEFAULT_KEY, &self.default_expiration);
        let default_ok = default_finding.is_none();
        findings.extend(default_finding);
        for (index, option) in self.options.iter().enumerate() {
            findings.extend(rules::time_duration(NAME, &format!("{OPTIONS_KEY}.{index}"), option));
        }
        if default_ok && !self.options.is_empty() && !self.options.contains(&self.default_expiration) {
            findings.push(Finding::error(
                NAME,
                DEFAULT_KEY,
                format!("{DEFAULT_KEY} `{}` must be one of {OPTIONS_KEY}", self.default_expiration),
            ));
        }
        findings
    }
}
