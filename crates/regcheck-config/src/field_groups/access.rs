// crates/regcheck-config/src/field_groups/access.rs
// ============================================================================
// Module: Access Settings
// Description: Authentication backend and user creation switches.
// Purpose: Validate the authentication type and login feature flags.
// Dependencies: regcheck-core
// ============================================================================

//! Authentication type and user creation switches.

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
pub const NAME: &str = "AccessSettings";
/// Authentication type key.
pub const AUTHENTICATION_TYPE: &str = "AUTHENTICATION_TYPE";
/// Accepted authentication types.
pub const AUTHENTICATION_TYPES: &[&str] = &["Database", "LDAP", "JWT", "Keystone", "OIDC", "AppToken"];
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[
    AUTHENTICATION_TYPE,
    "FEATURE_DIRECT_LOGIN",
    "FEATURE_USER_CREATION",
    "FEATURE_INVITE_ONLY_USER_CREATION",
    "FEATURE_ANONYMOUS_ACCESS",
];

/// Reads `AUTHENTICATION_TYPE` with its default.
///
/// # Errors
///
/// Returns [`ConfigError::Construction`] when the value is not a string.
pub fn authentication_type(raw: &RawConfig) -> Result<String, ConfigError> {
    raw.decode_or(AUTHENTICATION_TYPE, "Database".to_string())
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Access settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSettings {
    /// Authentication backend.
    pub authentication_type: String,
    /// Username/password login allowed.
    pub direct_login: bool,
    /// Self-service user creation.
    pub user_creation: bool,
    /// User creation requires an invitation.
    pub invite_only_user_creation: bool,
    /// Anonymous pulls of public repositories.
    pub anonymous_access: bool,
}

impl AccessSettings {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            authentication_type: authentication_type(raw)?,
            direct_login: raw.decode_or("FEATURE_DIRECT_LOGIN", true)?,
            user_creation: raw.decode_or("FEATURE_USER_CREATION", true)?,
            invite_only_user_creation: raw.decode_or("FEATURE_INVITE_ONLY_USER_CREATION", false)?,
            anonymous_access: raw.decode_or("FEATURE_ANONYMOUS_ACCESS", true)?,
        })
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        let mut findings: Vec<Finding> =
            rules::one_of(NAME, AUTHENTICATION_TYPE, &self.authentication_type, AUTHENTICATION_TYPES)
                .into_iter()
                .collect();
        if self.invite_only_user_creation && !self.user_creation {
            findings.push(Finding::warning(
                NAME,
                "FEATURE_INVITE_ONLY_USER_CREATION",
                "FEATURE_INVITE_ONLY_USER_CREATION has no effect while FEATURE_USER_CREATION is false",
            ));
        }
        findings
    }
}
