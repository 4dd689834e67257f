// crates/regcheck-config/src/field_groups/oidc.rs
// ============================================================================
// Module: OIDC
// Description: OpenID Connect login providers (`*_LOGIN_CONFIG` keys).
// Purpose: Validate provider settings and prove the client credentials work.
// Dependencies: regcheck-core, serde
// ============================================================================

//! ## Overview
//! Any top-level key ending in `_LOGIN_CONFIG` whose object carries
//! `OIDC_SERVER` is an OIDC provider. The probe loads discovery and then
//! exchanges a code that cannot be valid: an `invalid_grant` answer proves
//! the endpoint is reachable and the client credentials were accepted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::TokenExchangeRequest;
use regcheck_core::ValidationOptions;
use regcheck_core::document::decode_value;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;
use serde::Deserialize;
use serde_json::Value;

use crate::field_groups::access;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "OIDC";
/// Suffix of provider keys.
pub const LOGIN_CONFIG_SUFFIX: &str = "_LOGIN_CONFIG";
/// Code sent to the token endpoint; never valid.
pub const PROBE_CODE: &str = "badcode";

/// Returns true when a top-level key holds an OIDC provider.
#[must_use]
pub fn is_provider_key(raw: &RawConfig, key: &str) -> bool {
    key.ends_with(LOGIN_CONFIG_SUFFIX)
        && matches!(raw.get(key), Some(Value::Object(map)) if map.contains_key("OIDC_SERVER"))
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// One provider object.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OidcProvider {
    /// Client id.
    #[serde(rename = "CLIENT_ID")]
    pub client_id: Option<String>,
    /// Client secret.
    #[serde(rename = "CLIENT_SECRET")]
    pub client_secret: Option<String>,
    /// Issuer URL ending in `/`.
    #[serde(rename = "OIDC_SERVER")]
    pub server: Option<String>,
    /// Display name.
    #[serde(rename = "SERVICE_NAME")]
    pub service_name: Option<String>,
    /// Requested scopes.
    #[serde(rename = "LOGIN_SCOPES")]
    pub login_scopes: Vec<String>,
    /// Provider options not interpreted here.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl std::fmt::Debug for OidcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcProvider")
            .field("client_id", &self.client_id)
            .field("server", &self.server)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

/// OIDC settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Oidc {
    /// Authentication backend.
    pub authentication_type: String,
    /// Providers keyed by configuration key, sorted.
    pub providers: Vec<(String, OidcProvider)>,
}

impl Oidc {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        let mut providers = Vec::new();
        for key in raw.keys().filter(|key| is_provider_key(raw, key)) {
            if let Some(value) = raw.get(key) {
                providers.push((key.to_string(), decode_value(key, value)?));
            }
        }
        Ok(Self {
            authentication_type: access::authentication_type(raw)?,
            providers,
        })
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        if self.providers.is_empty() {
            if self.authentication_type == "OIDC" {
                findings.push(Finding::error(
                    NAME,
                    "AUTHENTICATION_TYPE",
                    "AUTHENTICATION_TYPE is OIDC but no *_LOGIN_CONFIG provider with OIDC_SERVER is configured",
                ));
            }
            return findings;
        }
        for (key, provider) in &self.providers {
            findings.extend(rules::require_string(NAME, &format!("{key}.CLIENT_ID"), provider.client_id.as_deref()));
            findings.extend(rules::require_string(
                NAME,
                &format!("{key}.CLIENT_SECRET"),
                provider.client_secret.as_deref(),
            ));
            let path = format!("{key}.OIDC_SERVER");
            match provider.server.as_deref().filter(|server| !server.trim().is_empty()) {
                None => findings.push(Finding::error(NAME, &path, format!("{path} is required"))),
                Some(server) => {
                    if let Some(finding) = rules::url(NAME, &path, server, &["http", "https"]) {
                        findings.push(finding);
                    } else if !server.ends_with('/') {
                        findings.push(Finding::error(NAME, &path, format!("{path} must end with a trailing /")));
                    }
                }
            }
        }
        findings
    }

    /// Runs the token exchange for each provider.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (key, provider) in &self.providers {
            let service = provider.service_name.clone().unwrap_or_else(|| key.clone());
            let request = TokenExchangeRequest {
                server: provider.server.clone().unwrap_or_default(),
                client_id: provider.client_id.clone().unwrap_or_default(),
                client_secret: provider.client_secret.clone().unwrap_or_default(),
                code: PROBE_CODE.to_string(),
            };
            let path = format!("{key}.OIDC_SERVER");
            let target = format!("identity provider {key}");
            match bounded(options, &target, options.probes.identity.exchange_code(&request)).await {
                Ok(response) => {
                    let error = response.error.unwrap_or_default();
                    if error.contains("invalid_grant") || (error.is_empty() && response.status < 400) {
                        continue;
                    }
                    if error.contains("access_denied") || error.contains("invalid_client") {
                        findings.push(Finding::error(NAME, &path, format!("incorrect credentials for OIDC {service}")));
                    } else {
                        findings.push(Finding::error(
                            NAME,
                            &path,
                            format!("unexpected token endpoint answer from OIDC {service}: status {} {error}", response.status),
                        ));
                    }
                }
                Err(err) => {
                    findings.push(Finding::error(NAME, &path, format!("could not reach OIDC server {service}: {err}")));
                }
            }
        }
        findings
    }
}
