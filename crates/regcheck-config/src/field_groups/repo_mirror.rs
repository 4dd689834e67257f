// crates/regcheck-config/src/field_groups/repo_mirror.rs
// ============================================================================
// Module: Repository Mirroring
// Description: Repository mirror worker settings.
// Purpose: Validate mirror hostname and interval when mirroring is on.
// Dependencies: regcheck-core
// ============================================================================

//! Repository mirroring settings, checked only when `FEATURE_REPO_MIRROR` is on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::rules;

use crate::field_groups::int;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "RepoMirror";
/// Keys owned by this group.
pub const FIELDS: &[&str] =
    &["FEATURE_REPO_MIRROR", "REPO_MIRROR_TLS_VERIFY", "REPO_MIRROR_SERVER_HOSTNAME", "REPO_MIRROR_INTERVAL"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Mirroring settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMirror {
    /// Mirroring enabled.
    pub enabled: bool,
    /// Verify upstream TLS.
    pub tls_verify: bool,
    /// Hostname mirror workers use to reach the registry.
    pub server_hostname: Option<String>,
    /// Seconds between mirror passes.
    pub interval: Option<i64>,
}

impl RepoMirror {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: raw.decode_or("FEATURE_REPO_MIRROR", false)?,
            tls_verify: raw.decode_or("REPO_MIRROR_TLS_VERIFY", true)?,
            server_hostname: raw.decode("REPO_MIRROR_SERVER_HOSTNAME")?,
            interval: int(raw, "REPO_MIRROR_INTERVAL")?,
        })
    }

    /// Structural rules; inactive unless mirroring is enabled.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if !self.enabled {
            return Vec::new();
        }
        let mut findings = Vec::new();
        if let Some(hostname) = self.server_hostname.as_deref().filter(|host| !host.trim().is_empty()) {
            findings.extend(rules::hostname(NAME, "REPO_MIRROR_SERVER_HOSTNAME", hostname));
        }
        if let Some(interval) = self.interval {
            findings.extend(rules::positive(NAME, "REPO_MIRROR_INTERVAL", interval));
        }
        findings
    }
}
