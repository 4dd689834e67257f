// crates/regcheck-config/src/field_groups/scanner.rs
// ============================================================================
// Module: Security Scanner
// Description: Vulnerability scanner (Clair v4) endpoint settings.
// Purpose: Validate scanner settings and probe the indexer.
// Dependencies: regcheck-core, base64
// ============================================================================

//! ## Overview
//! Active only when `FEATURE_SECURITY_SCANNER` is set. The probe fetches the
//! indexer state endpoint below `SECURITY_SCANNER_V4_ENDPOINT`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::HttpRequest;
use regcheck_core::RawConfig;
use regcheck_core::ValidationOptions;
use regcheck_core::rules;
use regcheck_core::runtime::bounded;

use crate::field_groups::int;
use crate::field_groups::trusted_ca_pem;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "SecurityScanner";
/// Endpoint key.
pub const ENDPOINT_KEY: &str = "SECURITY_SCANNER_V4_ENDPOINT";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &[
    "FEATURE_SECURITY_SCANNER",
    ENDPOINT_KEY,
    "SECURITY_SCANNER_V4_PSK",
    "SECURITY_SCANNER_INDEXING_INTERVAL",
];
/// Indexer path probed on the scanner.
pub const INDEX_STATE_PATH: &str = "indexer/api/v1/index_state";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Scanner settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityScanner {
    /// Scanner enabled.
    pub enabled: bool,
    /// Scanner base URL.
    pub endpoint: Option<String>,
    /// Pre-shared key (base64).
    pub psk: Option<String>,
    /// Seconds between indexing passes.
    pub indexing_interval: Option<i64>,
}

impl std::fmt::Debug for SecurityScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityScanner")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("indexing_interval", &self.indexing_interval)
            .finish_non_exhaustive()
    }
}

impl SecurityScanner {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: raw.decode_or("FEATURE_SECURITY_SCANNER", false)?,
            endpoint: raw.decode(ENDPOINT_KEY)?,
            psk: raw.decode("SECURITY_SCANNER_V4_PSK")?,
            indexing_interval: int(raw, "SECURITY_SCANNER_INDEXING_INTERVAL")?,
        })
    }

    /// Structural rules; inactive unless the scanner is enabled.
    #[must_use]
    pub fn check(&self) -> Vec<Finding> {
        if !self.enabled {
            return Vec::new();
        }
        let mut findings = Vec::new();
        match self.endpoint.as_deref().filter(|endpoint| !endpoint.trim().is_empty()) {
            None => findings.push(Finding::error(NAME, ENDPOINT_KEY, format!("{ENDPOINT_KEY} is required"))),
            Some(endpoint) => findings.extend(rules::url(NAME, ENDPOINT_KEY, endpoint, &["http", "https"])),
        }
        if let Some(psk) = self.psk.as_deref().filter(|psk| !psk.is_empty())
            && STANDARD.decode(psk.trim()).is_err()
        {
            findings.push(Finding::error(NAME, "SECURITY_SCANNER_V4_PSK", "SECURITY_SCANNER_V4_PSK must be base64"));
        }
        if let Some(interval) = self.indexing_interval {
            findings.extend(rules::positive(NAME, "SECURITY_SCANNER_INDEXING_INTERVAL", interval));
        }
        findings
    }

    /// Fetches the indexer state.
    pub async fn probe(&self, options: &ValidationOptions) -> Vec<Finding> {
        if !self.enabled {
            return Vec::new();
        }
        let endpoint = self.endpoint.clone().unwrap_or_default();
        let request = HttpRequest {
            url: format!("{}/{INDEX_STATE_PATH}", endpoint.trim().trim_end_matches('/')),
            ca_pem: trusted_ca_pem(&options.certificates, None),
        };
        match bounded(options, "security scanner", options.probes.http.get(&request)).await {
            Ok(status) if (200..300).contains(&status) => Vec::new(),
            Ok(status) => vec![Finding::error(
                NAME,
                ENDPOINT_KEY,
                format!("security scanner at {endpoint} answered {INDEX_STATE_PATH} with status {status}"),
            )],
            Err(err) => {
                vec![Finding::error(NAME, ENDPOINT_KEY, format!("could not reach security scanner at {endpoint}: {err}"))]
            }
        }
    }
}
