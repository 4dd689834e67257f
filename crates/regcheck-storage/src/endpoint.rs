// crates/regcheck-storage/src/endpoint.rs
// ============================================================================
// Module: Endpoint Resolution
// Description: Per-driver endpoint rules for storage probes.
// Purpose: Derive one probe URL from the parameters a driver declares.
// Dependencies: crate::entry
// ============================================================================

//! ## Overview
//! - S3-compatible gateways: `hostname[:port]`, TLS only when `is_secure`
//!   is true, path-style addressing.
//! - AWS S3 dialects: `endpoint_url` wins over legacy `host[:port]`; neither
//!   means the provider default endpoint.
//! - Google Cloud Storage: fixed endpoint.
//! - Azure: `endpoint_url`, else the standard per-account blob endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::entry::StorageParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Google Cloud Storage interoperability endpoint.
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolved probe endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Endpoint URL; `None` uses the provider default.
    pub url: Option<String>,
    /// Whether buckets are addressed in the path.
    pub force_path_style: bool,
}

/// Appends `:port` when a non-zero port is configured.
fn with_port(host: &str, port: Option<i64>) -> String {
    match port {
        Some(port) if port != 0 => format!("{host}:{port}"),
        _ => host.to_string(),
    }
}

/// Adds a scheme unless the host already carries one.
fn with_scheme(host: String, secure: bool) -> String {
    if host.contains("://") {
        host
    } else if secure {
        format!("https://{host}")
    } else {
        format!("http://{host}")
    }
}

/// Endpoint for RADOS gateway, OCS and IBM Cloud gateways.
#[must_use]
pub fn s3_compatible(params: &StorageParams) -> Endpoint {
    let host = with_port(params.hostname.as_deref().unwrap_or_default().trim(), params.port);
    Endpoint {
        url: Some(with_scheme(host, params.is_secure.unwrap_or(false))),
        force_path_style: true,
    }
}

/// Endpoint for AWS S3, IRSA, STS and CloudFront-fronted entries.
#[must_use]
pub fn aws_s3(params: &StorageParams) -> Endpoint {
    if let Some(url) = params.endpoint_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        return Endpoint {
            url: Some(url.to_string()),
            force_path_style: true,
        };
    }
    match params.host.as_deref().map(str::trim).filter(|host| !host.is_empty()) {
        Some(host) => Endpoint {
            url: Some(with_scheme(with_port(host, params.port), true)),
            force_path_style: true,
        },
        None => Endpoint {
            url: None,
            force_path_style: false,
        },
    }
}

/// Endpoint for Google Cloud Storage.
#[must_use]
pub fn google_cloud() -> Endpoint {
    Endpoint {
        url: Some(GCS_ENDPOINT.to_string()),
        force_path_style: true,
    }
}

/// Blob service endpoint for an Azure account.
#[must_use]
pub fn azure(params: &StorageParams, account_name: &str) -> String {
    params
        .endpoint_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map_or_else(
            || format!("https://{account_name}.blob.core.windows.net"),
            |url| url.trim_end_matches('/').to_string(),
        )
}
