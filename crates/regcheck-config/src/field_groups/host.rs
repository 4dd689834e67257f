// crates/regcheck-config/src/field_groups/host.rs
// ============================================================================
// Module: Host Settings
// Description: Server hostname, URL scheme and TLS material.
// Purpose: Validate how the registry is addressed and terminates TLS.
// Dependencies: regcheck-core, rustls-pki-types
// ============================================================================

//! ## Overview
//! When the registry serves `https` itself (no external TLS termination),
//! `ssl.cert` and `ssl.key` must be in the bundle and decode as PEM.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::Certificates;
use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::RawConfig;
use regcheck_core::rules;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::PrivateKeyDer;
use rustls_pki_types::pem::PemObject;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Field group name.
pub const NAME: &str = "HostSettings";
/// Keys owned by this group.
pub const FIELDS: &[&str] = &["SERVER_HOSTNAME", "PREFERRED_URL_SCHEME", "EXTERNAL_TLS_TERMINATION"];
/// Bundle file holding the server certificate chain.
pub const SSL_CERT: &str = "ssl.cert";
/// Bundle file holding the server private key.
pub const SSL_KEY: &str = "ssl.key";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Host settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// Public hostname with optional port.
    pub server_hostname: Option<String>,
    /// `http` or `https`.
    pub preferred_url_scheme: String,
    /// TLS is terminated in front of the registry.
    pub external_tls_termination: bool,
}

impl HostSettings {
    /// Decodes the group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] for mistyped values.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            server_hostname: raw.decode("SERVER_HOSTNAME")?,
            preferred_url_scheme: raw.decode_or("PREFERRED_URL_SCHEME", "http".to_string())?,
            external_tls_termination: raw.decode_or("EXTERNAL_TLS_TERMINATION", false)?,
        })
    }

    /// Structural rules.
    #[must_use]
    pub fn check(&self, certificates: &Certificates) -> Vec<Finding> {
        let mut findings = Vec::new();
        if let Some(hostname) = self.server_hostname.as_deref().filter(|host| !host.trim().is_empty()) {
            findings.extend(rules::hostname(NAME, "SERVER_HOSTNAME", hostname));
            let host = hostname.split(':').next().unwrap_or_default();
            if host.eq_ignore_ascii_case("localhost") {
                findings.push(Finding::warning(
                    NAME,
                    "SERVER_HOSTNAME",
                    "SERVER_HOSTNAME is localhost; clients outside this machine cannot reach the registry",
                ));
            }
        }
        findings.extend(rules::one_of(NAME, "PREFERRED_URL_SCHEME", &self.preferred_url_scheme, &["http", "https"]));
        if self.preferred_url_scheme == "https" && !self.external_tls_termination {
            findings.extend(tls_material(certificates));
        }
        findings
    }
}

/// Checks that the server certificate and key exist and decode.
fn tls_material(certificates: &Certificates) -> Vec<Finding> {
    let mut findings = Vec::new();
    match certificates.get(SSL_CERT) {
        None => findings.push(Finding::error(
            NAME,
            SSL_CERT,
            "PREFERRED_URL_SCHEME is https without external TLS termination, but ssl.cert is missing from the bundle",
        )),
        Some(bytes) => {
            if !matches!(CertificateDer::pem_slice_iter(bytes).next(), Some(Ok(_))) {
                findings.push(Finding::error(NAME, SSL_CERT, "ssl.cert does not contain a PEM certificate"));
            }
        }
    }
    match certificates.get(SSL_KEY) {
        None => findings.push(Finding::error(
            NAME,
            SSL_KEY,
            "PREFERRED_URL_SCHEME is https without external TLS termination, but ssl.key is missing from the bundle",
        )),
        Some(bytes) => {
            if PrivateKeyDer::from_pem_slice(bytes).is_err() {
                findings.push(Finding::error(NAME, SSL_KEY, "ssl.key does not contain a PEM private key"));
            }
        }
    }
    findings
}
