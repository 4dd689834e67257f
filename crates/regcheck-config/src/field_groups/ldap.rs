// crates/regcheck-config/src/field_groups/ldap.rs
// ============================================================================
// Module: LDAP
// Description: Directory service authentication settings.
// Purpose: Validate LDAP settings and probe bind plus user search.
// Dependencies: regcheck-core
// ============================================================================

//! ## Overview
//! Active only when `AUTHENTICATION_TYPE` is `LDAP`. The probe binds as the
//! admin DN and runs one subtree search `(&(<uid attr>=*)<user filter>)`
//! below the joined base DN, trusting `ldap.crt` and `extra_ca_certs/`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::DirectoryRequest;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;

use crate::field_groups::access;
use crate::field_groups::trusted_ca_pem;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "LDAP";
/// Bundle file holding the directory CA.
pub const LDAP_CA_FILE: &str = "ldap.crt";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[
    "LDAP_URI",
    "LDAP_ADMIN_DN",
    "LDAP_ADMIN_PASSWD",
    "LDAP_BASE_DN",
    "LDAP_UID_ATTR",
    "LDAP_EMAIL_ATTR",
    "LDAP_USER_FILTER",
    "LDAP_ALLOW_INSECURE_FALLBACK",
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// LDAP settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Ldap {
    /// Authentication backend.
    pub authentication_type: String,
    /// Directory URI.
    pub uri: Option<String>,
    /// Admin bind DN.
    pub admin_dn: Option<String>,
    /// Admin bind password.
    pub admin_password: Option<String>,
    /// Base DN components.
    pub base_dn: Vec<String>,
    /// User id attribute.
    pub uid_attr: String,
    /// Email attribute.
    pub email_attr: String,
    /// Extra user filter.
    pub user_filter: Option<String>,
    /// Plain `ldap://` accepted without warning.
    pub allow_insecure_fallback: bool,
}

impl std::fmt::Debug for Ldap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ldap")
            .field("uri", &self.uri)
            .field("admin_dn", &self.admin_dn)
            .field("base_dn", &self.base_dn)
            .finish_non_exhaustive()
    }
}

impl Ldap {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            authentication_type: access::authentication_type(raw)?,
            uri: raw.decode("LDAP_URI")?,
            admin_dn: raw.decode("LDAP_ADMIN_DN")?,
            admin_password: raw.decode("LDAP_ADMIN_PASSWD")?,
            base_dn: raw.decode_or_default("LDAP_BASE_DN")?,
            uid_attr: raw.decode_or("LDAP_UID_ATTR", "uid".to_string())?,
            email_attr: raw.decode_or("LDAP_EMAIL_ATTR", "mail".to_string())?,
            user_filter: raw.decode("LDAP_USER_FILTER")?,
            allow_insecure_fallback: raw.decode_or("LDAP_ALLOW_INSECURE_FALLBACK", false)?,
        })
    }

    /// Returns true when LDAP is the authentication backend.
    fn active(&self) -> bool {
        self.authentication_type == "LDAP"
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if !self.active() {
            return Vec::new();
        }
        let mut findings = Vec::new();
        match self.uri.as_deref().filter(|uri| !uri.trim().is_empty()) {
            None => findings.push(Finding::error(NAME, "LDAP_URI", "LDAP_URI is required")),
            Some(uri) => {
                if !(uri.starts_with("ldap://") || uri.starts_with("ldaps://")) {
                    findings.push(Finding::error(NAME, "LDAP_URI", "LDAP_URI must start with ldap:// or ldaps://"));
                } else if uri.starts_with("ldap://") && !self.allow_insecure_fallback {
                    findings.push(Finding::warning(
                        NAME,
                        "LDAP_URI",
                        "LDAP_URI uses plain ldap:// without LDAP_ALLOW_INSECURE_FALLBACK; credentials travel unencrypted",
                    ));
                }
            }
        }
        findings.extend(rules::require_string(NAME, "LDAP_ADMIN_DN", self.admin_dn.as_deref()));
        findings.extend(rules::require_string(NAME, "LDAP_ADMIN_PASSWD", self.admin_password.as_deref()));
        findings.extend(rules::require_non_empty(NAME, "LDAP_BASE_DN", &self.base_dn));
        findings.extend(rules::require_string(NAME, "LDAP_UID_ATTR", Some(self.uid_attr.as_str())));
        findings.extend(rules::require_string(NAME, "LDAP_EMAIL_ATTR", Some(self.email_attr.as_str())));
        if let Some(filter) = self.user_filter.as_deref().filter(|filter| !filter.is_empty())
            && !(filter.starts_with('(') && filter.ends_with(')'))
        {
            findings.push(Finding::error(NAME, "LDAP_USER_FILTER", "LDAP_USER_FILTER must be wrapped in parentheses"));
        }
        findings
    }

    /// Search filter sent by the probe.
    #[must_use]
    pub fn search_filter(&self) -> String {
        format!("(&({}=*){})", self.uid_attr, self.user_filter.as_deref().unwrap_or_default())
    }

    /// Builds the probe request.
    fn request(&self, certificates: &Certificates) -> DirectoryRequest {
        DirectoryRequest {
            uri: self.uri.clone().unwrap_or_default().trim().to_string(),
            bind_dn: self.admin_dn.clone().unwrap_or_default(),
            password: self.admin_password.clone().unwrap_or_default(),
            base_dn: self.base_dn.join(","),
            filter: self.search_filter(),
            ca_pem: trusted_ca_pem(certificates, Some(LDAP_CA_FILE)),
        }
    }

    /// Binds and searches once.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        if !self.active() {
            return Vec::new();
        }
        let request = self.request(&options.certificates);
        match bounded(options, "directory LDAP_URI", options.probes.directory.bind_and_search(&request)).await {
            Ok(0) => vec![Finding::warning(
                NAME,
                "LDAP_BASE_DN",
                format!("LDAP search below `{}` with filter {} returned no users", request.base_dn, request.filter),
            )],
            Ok(_) => Vec::new(),
            Err(err) => vec![Finding::error(NAME, "LDAP_URI", format!("could not verify LDAP server {}: {err}", request.uri))],
        }
    }
}
