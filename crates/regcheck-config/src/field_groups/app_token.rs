// crates/regcheck-config/src/field_groups/app_token.rs
// ============================================================================
// Module: App Token Authentication
// Description: Rules that apply only when AUTHENTICATION_TYPE is AppToken.
// Purpose: Require app-specific tokens and forbid direct login.
// Dependencies: regcheck-core
// ============================================================================

//! App-specific token authentication rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::rules;

use crate::field_groups::access;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "AppTokenAuthentication";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &["FEATURE_APP_SPECIFIC_TOKENS", "APP_SPECIFIC_TOKEN_EXPIRATION"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// App token authentication settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTokenAuthentication {
    /// Authentication backend.
    pub authentication_type: String,
    /// App-specific tokens enabled.
    pub app_specific_tokens: bool,
    /// Username/password login allowed.
    pub direct_login: bool,
    /// Token lifetime.
    pub token_expiration: Option<String>,
}

impl AppTokenAuthentication {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            authentication_type: access::authentication_type(raw)?,
            app_specific_tokens: raw.decode_or("FEATURE_APP_SPECIFIC_TOKENS", true)?,
            direct_login: raw.decode_or("FEATURE_DIRECT_LOGIN", true)?,
            token_expiration: raw.decode("APP_SPECIFIC_TOKEN_EXPIRATION")?,
        })
    }

    /// Structural rules; inactive unless the type is exactly `AppToken`.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if self.authentication_type != "AppToken" {
            return Vec::new();
        }
        let mut findings = Vec::new();
        if !self.app_specific_tokens {
            findings.push(Finding::error(
                NAME,
                "FEATURE_APP_SPECIFIC_TOKENS",
                "FEATURE_APP_SPECIFIC_TOKENS must be enabled when AUTHENTICATION_TYPE is AppToken",
            ));
        }
        if self.direct_login {
            findings.push(Finding::error(
                NAME,
                "FEATURE_DIRECT_LOGIN",
                "FEATURE_DIRECT_LOGIN must be disabled when AUTHENTICATION_TYPE is AppToken",
            ));
        }
        if let Some(expiration) = &self.token_expiration {
            findings.extend(rules::time_duration(NAME, "APP_SPECIFIC_TOKEN_EXPIRATION", expiration));
        }
        findings
    }
}
